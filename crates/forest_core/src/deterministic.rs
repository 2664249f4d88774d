//! Deterministic utilities for reproducible training
//!
//! Provides a seedable LCG, sampling helpers built on it and the split
//! tie-breaker, so identical inputs yield identical forests on every run.

use std::cmp::Ordering;
use std::num::Wrapping;

/// 64-bit linear congruential generator (Knuth MMIX constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: Wrapping(seed),
        };
        // Discard the first output so nearby seeds diverge immediately
        rng.next_u64();
        rng
    }

    /// Generator for one tree of the ensemble
    pub fn for_tree(seed: u64, tree_idx: usize) -> Self {
        Self::new(seed.wrapping_add(tree_idx as u64))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        let x = self.state.0;
        // High bits of an LCG are the well-distributed ones
        x ^ (x >> 29)
    }

    /// Uniform value in `[0, max)`; returns 0 when `max == 0`
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_u64() >> 11) % max as u64) as usize
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i + 1);
            items.swap(i, j);
        }
    }

    /// Pick `k` distinct values from `0..n`, returned in ascending order.
    pub fn choose_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let k = k.min(n);
        let mut pool: Vec<usize> = (0..n).collect();
        // Partial Fisher-Yates over the first k slots
        for i in 0..k {
            let j = i + self.next_range(n - i);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool.sort_unstable();
        pool
    }

    /// Row indices for one tree's training subset.
    ///
    /// With replacement this draws `n` rows independently; without it every
    /// row appears exactly once in shuffled order.
    pub fn bootstrap_indices(&mut self, n: usize, replacement: bool) -> Vec<usize> {
        if replacement {
            (0..n).map(|_| self.next_range(n)).collect()
        } else {
            let mut indices: Vec<usize> = (0..n).collect();
            self.shuffle(&mut indices);
            indices
        }
    }
}

/// Deterministic tie-breaker for split selection
///
/// Orders candidates by feature index, then by the rank of the threshold
/// among that feature's candidate cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold_rank: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold_rank: usize) -> Self {
        Self {
            feature_idx,
            threshold_rank,
        }
    }
}

/// Compare two gains, treating them as equal within a relative tolerance so
/// that float summation noise does not decide between candidate splits.
pub fn compare_gain(a: f64, b: f64) -> Ordering {
    let tolerance = 1e-12 * a.abs().max(b.abs()).max(1.0);
    if (a - b).abs() <= tolerance {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}
