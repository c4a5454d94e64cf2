//! Deterministic weighted downsampling.
//!
//! When a file exceeds the splat budget we keep the `k` items with the
//! smallest Efraimidis–Spiraki keys `-ln(U) / w`. The generator is seeded
//! from the file's byte length, so the same file always yields the same
//! subset and therefore the same rendered image.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Splitmix64. Small, seedable, and good enough for sampling keys.
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in (0, 1].
    pub fn next_unit(&mut self) -> f64 {
        (((self.next_u64() >> 11) + 1) as f64) * (1.0 / (1u64 << 53) as f64)
    }
}

#[derive(PartialEq)]
struct HeapEntry {
    key: f64,
    index: u32,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on key so the worst survivor sits on top.
        self.key
            .total_cmp(&other.key)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select at most `k` indices weighted by `weights`, seeded by `seed`.
/// The returned indices are sorted ascending to preserve memory locality
/// in the sampled record array.
pub fn reservoir_indices(weights: &[f32], k: usize, seed: u64) -> Vec<usize> {
    if weights.len() <= k {
        return (0..weights.len()).collect();
    }
    let mut rng = SplitMix64::new(seed);
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(k + 1);
    for (i, &w) in weights.iter().enumerate() {
        let u = rng.next_unit();
        let key = if w > 0.0 {
            -u.ln() / f64::from(w)
        } else {
            f64::INFINITY
        };
        if heap.len() < k {
            heap.push(HeapEntry { key, index: i as u32 });
        } else if let Some(top) = heap.peek() {
            if key < top.key {
                heap.pop();
                heap.push(HeapEntry { key, index: i as u32 });
            }
        }
    }
    let mut indices: Vec<usize> = heap.into_iter().map(|e| e.index as usize).collect();
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let weights: Vec<f32> = (0..1000).map(|i| (i % 17) as f32 + 0.1).collect();
        let a = reservoir_indices(&weights, 100, 12345);
        let b = reservoir_indices(&weights, 100, 12345);
        assert_eq!(a, b);
        let c = reservoir_indices(&weights, 100, 54321);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sorted_and_bounded() {
        let weights = vec![1.0f32; 500];
        let picked = reservoir_indices(&weights, 64, 7);
        assert_eq!(picked.len(), 64);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|&i| i < 500));
    }

    #[test]
    fn test_under_budget_keeps_all() {
        let weights = vec![1.0f32; 10];
        assert_eq!(reservoir_indices(&weights, 64, 1), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_heavy_weights_favored() {
        // 10 heavy items among 1000 near-zero ones; with k = 10 the heavy
        // ones should dominate the selection across several seeds.
        let mut weights = vec![1e-4f32; 1000];
        for i in 0..10 {
            weights[i * 100] = 1000.0;
        }
        let mut heavy_hits = 0;
        for seed in 0..20u64 {
            let picked = reservoir_indices(&weights, 10, seed);
            heavy_hits += picked.iter().filter(|&&i| i % 100 == 0 && i / 100 < 10).count();
        }
        assert!(heavy_hits > 180, "heavy items picked only {heavy_hits}/200 times");
    }

    #[test]
    fn test_unit_in_range() {
        let mut rng = SplitMix64::new(99);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!(u > 0.0 && u <= 1.0);
        }
    }
}
