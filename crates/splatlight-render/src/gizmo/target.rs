//! Gizmo target abstraction.
//!
//! The gizmo addresses whatever it manipulates through a small capability
//! set: three getters and three setters of 3-vectors, plus a bounding box
//! for the overlay. No back-pointer from target to gizmo exists; the
//! concrete targets are a mesh instance, a proxy over the splat store's
//! model transform, and a composite grouping meshes under a shared pivot.

use glam::{Quat, Vec3};

use splatlight_core::angles::{euler_from_quat, quat_from_euler};
use splatlight_core::{Aabb, Transform};

use crate::mesh::MeshInstance;
use crate::splat_store::SplatStore;

pub trait TransformTarget {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    /// Intrinsic XYZ Euler angles, radians.
    fn rotation(&self) -> Vec3;
    fn set_rotation(&mut self, euler: Vec3);
    fn scale(&self) -> Vec3;
    fn set_scale(&mut self, scale: Vec3);
    fn world_aabb(&self) -> Aabb;
}

impl TransformTarget for MeshInstance {
    fn position(&self) -> Vec3 {
        self.transform.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    fn rotation(&self) -> Vec3 {
        self.transform.rotation
    }

    fn set_rotation(&mut self, euler: Vec3) {
        self.transform.rotation = euler;
    }

    fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    fn world_aabb(&self) -> Aabb {
        MeshInstance::world_aabb(self)
    }
}

/// Write-through proxy over the splat store: every setter recomposes the
/// store's model matrix, which the next frame's sort and draw consume.
pub struct SplatTarget<'a> {
    pub store: &'a mut SplatStore,
}

impl TransformTarget for SplatTarget<'_> {
    fn position(&self) -> Vec3 {
        self.store.transform().position
    }

    fn set_position(&mut self, position: Vec3) {
        let mut t = self.store.transform();
        t.position = position;
        self.store.set_transform(t);
    }

    fn rotation(&self) -> Vec3 {
        self.store.transform().rotation
    }

    fn set_rotation(&mut self, euler: Vec3) {
        let mut t = self.store.transform();
        t.rotation = euler;
        self.store.set_transform(t);
    }

    fn scale(&self) -> Vec3 {
        self.store.transform().scale
    }

    fn set_scale(&mut self, scale: Vec3) {
        let mut t = self.store.transform();
        t.scale = scale;
        self.store.set_transform(t);
    }

    fn world_aabb(&self) -> Aabb {
        self.store.world_aabb()
    }
}

/// Several meshes manipulated as one object about a shared pivot. The
/// pivot transform is owned by the caller and carries the group's
/// accumulated rotation and scale across borrows; a composite is
/// reconstructed per event, so an internal pivot would reset mid-drag.
pub struct CompositeTarget<'a> {
    meshes: &'a mut [MeshInstance],
    members: Vec<usize>,
    pivot: &'a mut Transform,
}

impl<'a> CompositeTarget<'a> {
    pub fn new(
        meshes: &'a mut [MeshInstance],
        members: Vec<usize>,
        pivot: &'a mut Transform,
    ) -> Self {
        Self {
            meshes,
            members,
            pivot,
        }
    }

    /// Fresh pivot for a newly formed group: the aggregate bounding box
    /// center, identity rotation and scale.
    pub fn aggregate_pivot(meshes: &[MeshInstance], members: &[usize]) -> Transform {
        let mut aabb = Aabb::EMPTY;
        for &i in members {
            if let Some(m) = meshes.get(i) {
                aabb = aabb.union(&m.world_aabb());
            }
        }
        Transform::from_position(aabb.center())
    }

    fn for_each_member(&mut self, mut f: impl FnMut(&mut MeshInstance)) {
        for &i in &self.members {
            if let Some(m) = self.meshes.get_mut(i) {
                f(m);
            }
        }
    }
}

impl TransformTarget for CompositeTarget<'_> {
    fn position(&self) -> Vec3 {
        self.pivot.position
    }

    fn set_position(&mut self, position: Vec3) {
        let delta = position - self.pivot.position;
        self.for_each_member(|m| m.transform.position += delta);
        self.pivot.position = position;
    }

    fn rotation(&self) -> Vec3 {
        self.pivot.rotation
    }

    fn set_rotation(&mut self, euler: Vec3) {
        let delta: Quat =
            quat_from_euler(euler) * quat_from_euler(self.pivot.rotation).inverse();
        let pivot_pos = self.pivot.position;
        self.for_each_member(|m| {
            let offset = m.transform.position - pivot_pos;
            m.transform.position = pivot_pos + delta * offset;
            m.transform.rotation =
                euler_from_quat(delta * quat_from_euler(m.transform.rotation));
        });
        self.pivot.rotation = euler;
    }

    fn scale(&self) -> Vec3 {
        self.pivot.scale
    }

    fn set_scale(&mut self, scale: Vec3) {
        let ratio = scale / self.pivot.scale.max(Vec3::splat(1e-6));
        let pivot_pos = self.pivot.position;
        self.for_each_member(|m| {
            let offset = m.transform.position - pivot_pos;
            m.transform.position = pivot_pos + offset * ratio;
            m.transform.scale *= ratio;
        });
        self.pivot.scale = scale;
    }

    fn world_aabb(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for &i in &self.members {
            if let Some(m) = self.meshes.get(i) {
                aabb = aabb.union(&m.world_aabb());
            }
        }
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn test_mesh(position: Vec3) -> MeshInstance {
        MeshInstance {
            mesh: 0,
            transform: Transform::from_position(position),
            color: [1.0; 4],
            local_aabb: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
            name: "m".into(),
        }
    }

    #[test]
    fn test_mesh_target_round_trip() {
        let mut mesh = test_mesh(Vec3::ZERO);
        let target: &mut dyn TransformTarget = &mut mesh;
        target.set_position(Vec3::new(1.0, 2.0, 3.0));
        target.set_scale(Vec3::splat(2.0));
        assert_eq!(target.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(target.scale(), Vec3::splat(2.0));
    }

    #[test]
    fn test_composite_translate_moves_members() {
        let mut meshes = vec![test_mesh(Vec3::new(-1.0, 0.0, 0.0)), test_mesh(Vec3::X)];
        let mut pivot = CompositeTarget::aggregate_pivot(&meshes, &[0, 1]);
        let mut composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
        assert!((composite.position() - Vec3::ZERO).length() < 1e-6);
        composite.set_position(Vec3::new(0.0, 5.0, 0.0));
        assert!((meshes[0].transform.position - Vec3::new(-1.0, 5.0, 0.0)).length() < 1e-6);
        assert!((meshes[1].transform.position - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-6);
        assert!((pivot.position - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_composite_rotation_orbits_members() {
        let mut meshes = vec![test_mesh(Vec3::new(-1.0, 0.0, 0.0)), test_mesh(Vec3::X)];
        let mut pivot = CompositeTarget::aggregate_pivot(&meshes, &[0, 1]);
        let mut composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
        composite.set_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        // A quarter turn about Y carries +X onto -Z around the shared pivot.
        assert!((meshes[1].transform.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!((meshes[0].transform.position - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_composite_scale_spreads_members() {
        let mut meshes = vec![test_mesh(Vec3::new(-1.0, 0.0, 0.0)), test_mesh(Vec3::X)];
        let mut pivot = CompositeTarget::aggregate_pivot(&meshes, &[0, 1]);
        let mut composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
        composite.set_scale(Vec3::splat(2.0));
        assert!((meshes[0].transform.position - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);
        assert!((meshes[0].transform.scale - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn test_composite_aggregate_aabb() {
        let mut meshes = vec![test_mesh(Vec3::new(-2.0, 0.0, 0.0)), test_mesh(Vec3::X * 2.0)];
        let mut pivot = CompositeTarget::aggregate_pivot(&meshes, &[0, 1]);
        let composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
        let aabb = composite.world_aabb();
        assert!((aabb.min.x - -2.5).abs() < 1e-6);
        assert!((aabb.max.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_composite_pivot_persists_across_borrows() {
        // The composite is rebuilt per pointer event; the caller-owned
        // pivot must carry the accumulated rotation between builds so
        // absolute setters do not re-apply old deltas.
        let mut meshes = vec![test_mesh(Vec3::new(-1.0, 0.0, 0.0)), test_mesh(Vec3::X)];
        let mut pivot = CompositeTarget::aggregate_pivot(&meshes, &[0, 1]);
        {
            let mut composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
            composite.set_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        }
        {
            let mut composite = CompositeTarget::new(&mut meshes, vec![0, 1], &mut pivot);
            // Same absolute rotation again: a no-op, not another quarter
            // turn.
            assert!((composite.rotation().y - FRAC_PI_2).abs() < 1e-6);
            composite.set_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        }
        assert!((meshes[1].transform.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
