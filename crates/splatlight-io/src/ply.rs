//! Binary PLY loader for standard 3DGS exports.
//!
//! The header is ASCII, terminated by `end_header` (LF or CRLF), and the
//! body is packed binary in either endianness. Recognized per-vertex
//! properties: `x y z`, `scale_0..2` (log-scale), `rot_0..3` (quaternion
//! `w,x,y,z`), `f_dc_0..2`, `opacity` (pre-sigmoid), and `f_rest_*` in
//! channel-first order, re-interleaved to `[R0,G0,B0,R1,...]` on load.
//! ASCII PLY is rejected; `list` properties are skipped.

use splatlight_core::record::SH_REST_FLOATS;
use splatlight_core::{SplatCloud, SplatRecord, SH_C0};

use crate::error::LoadError;
use crate::sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<Self, LoadError> {
        match name {
            "char" | "int8" => Ok(Self::I8),
            "uchar" | "uint8" => Ok(Self::U8),
            "short" | "int16" => Ok(Self::I16),
            "ushort" | "uint16" => Ok(Self::U16),
            "int" | "int32" => Ok(Self::I32),
            "uint" | "uint32" => Ok(Self::U32),
            "float" | "float32" => Ok(Self::F32),
            "double" | "float64" => Ok(Self::F64),
            other => Err(LoadError::UnknownScalarType(other.to_string())),
        }
    }

    fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// What a recognized vertex property feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    X,
    Y,
    Z,
    Scale(usize),
    Rot(usize),
    FDc(usize),
    Opacity,
    FRest(usize),
    Ignore,
}

impl Role {
    fn from_name(name: &str) -> Self {
        match name {
            "x" => Self::X,
            "y" => Self::Y,
            "z" => Self::Z,
            "opacity" => Self::Opacity,
            "scale_0" => Self::Scale(0),
            "scale_1" => Self::Scale(1),
            "scale_2" => Self::Scale(2),
            "rot_0" => Self::Rot(0),
            "rot_1" => Self::Rot(1),
            "rot_2" => Self::Rot(2),
            "rot_3" => Self::Rot(3),
            "f_dc_0" => Self::FDc(0),
            "f_dc_1" => Self::FDc(1),
            "f_dc_2" => Self::FDc(2),
            _ => match name.strip_prefix("f_rest_").and_then(|n| n.parse().ok()) {
                Some(i) => Self::FRest(i),
                None => Self::Ignore,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Property {
    Scalar(Role, ScalarType),
    List { count: ScalarType, elem: ScalarType },
}

struct Header {
    big_endian: bool,
    vertex_count: usize,
    properties: Vec<Property>,
    /// One past the highest `f_rest_*` index, 0 when absent.
    rest_count: usize,
    body_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header, LoadError> {
    let mut pos = 0usize;
    let mut line_no = 0usize;

    let next_line = |pos: &mut usize| -> Result<Option<String>, LoadError> {
        if *pos >= bytes.len() {
            return Ok(None);
        }
        let rest = &bytes[*pos..];
        let end = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => i,
            None => return Ok(None),
        };
        let mut line = &rest[..end];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        *pos += end + 1;
        let s = std::str::from_utf8(line)
            .map_err(|_| LoadError::Malformed("non-ASCII bytes in PLY header".into()))?;
        Ok(Some(s.to_string()))
    };

    let magic = next_line(&mut pos)?
        .ok_or_else(|| LoadError::UnsupportedFormat("missing ply magic".into()))?;
    if magic.trim_end() != "ply" {
        return Err(LoadError::UnsupportedFormat("missing ply magic".into()));
    }

    let mut big_endian = None;
    let mut vertex_count = None;
    let mut properties = Vec::new();
    let mut rest_count = 0usize;
    let mut in_vertex = false;
    let mut saw_end = false;

    while let Some(line) = next_line(&mut pos)? {
        line_no += 1;
        if line_no > 4096 {
            return Err(LoadError::Malformed("PLY header too long".into()));
        }
        let mut tokens = line.split_ascii_whitespace();
        match tokens.next() {
            Some("comment") | Some("obj_info") | None => {}
            Some("format") => match tokens.next() {
                Some("binary_little_endian") => big_endian = Some(false),
                Some("binary_big_endian") => big_endian = Some(true),
                Some("ascii") => {
                    return Err(LoadError::UnsupportedFormat("ASCII PLY".into()))
                }
                other => {
                    return Err(LoadError::UnsupportedFormat(format!(
                        "unknown PLY format {:?}",
                        other.unwrap_or("")
                    )))
                }
            },
            Some("element") => {
                let name = tokens.next().unwrap_or("");
                let count: usize = tokens
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| LoadError::Malformed("bad element count".into()))?;
                if name == "vertex" {
                    vertex_count = Some(count);
                    in_vertex = true;
                } else {
                    // Elements after vertex trail the data we read and are
                    // ignored; ones before it would shift the body offsets.
                    if vertex_count.is_none() && count > 0 {
                        return Err(LoadError::UnsupportedFormat(format!(
                            "element '{}' precedes vertex data",
                            name
                        )));
                    }
                    in_vertex = false;
                }
            }
            Some("property") => {
                if !in_vertex {
                    continue;
                }
                let first = tokens
                    .next()
                    .ok_or_else(|| LoadError::Malformed("bare property line".into()))?;
                if first == "list" {
                    let count = ScalarType::parse(tokens.next().unwrap_or(""))?;
                    let elem = ScalarType::parse(tokens.next().unwrap_or(""))?;
                    properties.push(Property::List { count, elem });
                } else {
                    let ty = ScalarType::parse(first)?;
                    let name = tokens
                        .next()
                        .ok_or_else(|| LoadError::Malformed("unnamed property".into()))?;
                    let role = Role::from_name(name);
                    if let Role::FRest(i) = role {
                        rest_count = rest_count.max(i + 1);
                    }
                    properties.push(Property::Scalar(role, ty));
                }
            }
            Some("end_header") => {
                saw_end = true;
                break;
            }
            Some(other) => {
                return Err(LoadError::Malformed(format!(
                    "unexpected header keyword '{}'",
                    other
                )))
            }
        }
    }

    if !saw_end {
        return Err(LoadError::UnsupportedFormat("missing end_header".into()));
    }
    let big_endian = big_endian
        .ok_or_else(|| LoadError::UnsupportedFormat("missing format line".into()))?;
    let vertex_count = vertex_count.ok_or(LoadError::NoVertices)?;

    Ok(Header {
        big_endian,
        vertex_count,
        properties,
        rest_count,
        body_offset: pos,
    })
}

struct BodyReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> BodyReader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], LoadError> {
        if self.pos + n > self.bytes.len() {
            return Err(LoadError::Malformed("truncated PLY body".into()));
        }
        let s = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn read_scalar(&mut self, ty: ScalarType) -> Result<f64, LoadError> {
        let be = self.big_endian;
        macro_rules! scalar {
            ($t:ty, $n:expr) => {{
                let raw: [u8; $n] = self.take($n)?.try_into().unwrap();
                let v = if be {
                    <$t>::from_be_bytes(raw)
                } else {
                    <$t>::from_le_bytes(raw)
                };
                v as f64
            }};
        }
        Ok(match ty {
            ScalarType::I8 => scalar!(i8, 1),
            ScalarType::U8 => scalar!(u8, 1),
            ScalarType::I16 => scalar!(i16, 2),
            ScalarType::U16 => scalar!(u16, 2),
            ScalarType::I32 => scalar!(i32, 4),
            ScalarType::U32 => scalar!(u32, 4),
            ScalarType::F32 => scalar!(f32, 4),
            ScalarType::F64 => scalar!(f64, 8),
        })
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Parse a binary PLY byte buffer into a full-record splat cloud,
/// downsampling to `max_splats` when the file exceeds the budget.
pub fn parse_ply(bytes: &[u8], max_splats: Option<usize>) -> Result<SplatCloud, LoadError> {
    let header = parse_header(bytes)?;
    if header.vertex_count == 0 {
        return Err(LoadError::NoVertices);
    }
    let has_position = [Role::X, Role::Y, Role::Z].iter().all(|r| {
        header
            .properties
            .iter()
            .any(|p| matches!(p, Property::Scalar(role, _) if role == r))
    });
    if !has_position {
        return Err(LoadError::Malformed(
            "PLY vertex element lacks x/y/z".into(),
        ));
    }

    let coeffs_per_channel = header.rest_count / 3;
    let sh_degree = match coeffs_per_channel {
        15.. => 3u32,
        8..=14 => 2,
        3..=7 => 1,
        _ => 0,
    };

    let mut reader = BodyReader {
        bytes,
        pos: header.body_offset,
        big_endian: header.big_endian,
    };

    let mut records = Vec::with_capacity(header.vertex_count);
    let mut rest = vec![0.0f32; header.rest_count];

    for _ in 0..header.vertex_count {
        let mut mean = [0.0f32; 3];
        let mut log_scale = [0.0f32; 3];
        let mut rot = [1.0f32, 0.0, 0.0, 0.0];
        let mut f_dc = [0.5f32; 3];
        let mut opacity_raw = 0.0f32;
        rest.fill(0.0);

        for prop in &header.properties {
            match *prop {
                Property::Scalar(role, ty) => {
                    let v = reader.read_scalar(ty)? as f32;
                    match role {
                        Role::X => mean[0] = v,
                        Role::Y => mean[1] = v,
                        Role::Z => mean[2] = v,
                        Role::Scale(i) => log_scale[i] = v,
                        Role::Rot(i) => rot[i] = v,
                        Role::FDc(i) => f_dc[i] = v,
                        Role::Opacity => opacity_raw = v,
                        Role::FRest(i) => rest[i] = v,
                        Role::Ignore => {}
                    }
                }
                Property::List { count, elem } => {
                    let n = reader.read_scalar(count)? as usize;
                    reader.take(n * elem.size())?;
                }
            }
        }

        let q_len_sq: f32 = rot.iter().map(|c| c * c).sum();
        let rotation = if q_len_sq > 1e-8 {
            let inv = q_len_sq.sqrt().recip();
            [rot[0] * inv, rot[1] * inv, rot[2] * inv, rot[3] * inv]
        } else {
            [1.0, 0.0, 0.0, 0.0]
        };

        let mut record = SplatRecord::new(
            mean.into(),
            [log_scale[0].exp(), log_scale[1].exp(), log_scale[2].exp()].into(),
            rotation,
            [
                0.5 + SH_C0 * f_dc[0],
                0.5 + SH_C0 * f_dc[1],
                0.5 + SH_C0 * f_dc[2],
            ],
            sigmoid(opacity_raw),
        );
        // Channel-first source -> channel-interleaved record layout.
        for k in 0..coeffs_per_channel.min(SH_REST_FLOATS / 3) {
            for c in 0..3 {
                record.sh[3 * k + c] = rest[c * coeffs_per_channel + k];
            }
        }
        records.push(record);
    }

    let records = apply_budget(records, max_splats, bytes.len() as u64);
    tracing::info!(
        "parsed PLY: {} splats, SH degree {}",
        records.len(),
        sh_degree
    );
    Ok(SplatCloud::from_records(records, sh_degree))
}

/// Downsample a record set to the budget with weighted reservoir sampling.
/// Weights are `opacity * max(scale)`; the seed is the file byte length.
fn apply_budget(
    records: Vec<SplatRecord>,
    max_splats: Option<usize>,
    seed: u64,
) -> Vec<SplatRecord> {
    let Some(budget) = max_splats else {
        return records;
    };
    if records.len() <= budget {
        return records;
    }
    let weights: Vec<f32> = records
        .iter()
        .map(|r| r.opacity * r.scale[0].max(r.scale[1]).max(r.scale[2]))
        .collect();
    let picked = sample::reservoir_indices(&weights, budget, seed);
    tracing::info!(
        "downsampled {} -> {} splats (budget {})",
        records.len(),
        picked.len(),
        budget
    );
    picked.into_iter().map(|i| records[i]).collect()
}
