//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression tree construction on variance reduction, with a
//! random subset of features examined at every split.

use std::cmp::Ordering;

use crate::deterministic::{compare_gain, LcgRng, SplitTieBreaker};
use crate::tree::{Node, Tree};

/// Growth parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split, already resolved against the data
    pub max_features: usize,
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        match compare_gain(self.gain, other.gain) {
            Ordering::Greater => true,
            Ordering::Equal => self.tie_breaker < other.tie_breaker,
            Ordering::Less => false,
        }
    }
}

/// Running sums for squared-error computations
#[derive(Clone, Copy, Default)]
struct Moments {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn push(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn minus(&self, other: &Moments) -> Moments {
        Moments {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn sse(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.count as f64).max(0.0)
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// `features` and `targets` must have equal length; the forest checks
    /// shapes before any builder is created.
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: TreeConfig) -> Self {
        debug_assert_eq!(features.len(), targets.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Grow a tree on the given row sample (duplicates allowed)
    pub fn build(&self, sample: &[usize], rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(sample, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let moments = self.moments(indices);

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
            || moments.sse() == 0.0
        {
            None
        } else {
            self.find_best_split(indices, &moments, rng)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current_idx, moments.mean(), indices.len()));
            return current_idx;
        };

        let (left_indices, right_indices) =
            self.split_samples(indices, split.feature_idx, split.threshold);

        // Reserve the slot; children are patched in once built
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            0,
            0,
            indices.len(),
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    fn find_best_split(
        &self,
        indices: &[usize],
        parent: &Moments,
        rng: &mut LcgRng,
    ) -> Option<SplitCandidate> {
        let candidates = rng.choose_indices(self.feature_count, self.config.max_features);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in candidates {
            if let Some(candidate) = self.best_split_for_feature(indices, feature_idx, parent) {
                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best.filter(|split| compare_gain(split.gain, 0.0) == Ordering::Greater)
    }

    /// Sweep the rows sorted by one feature, scoring every cut between
    /// distinct consecutive values.
    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature_idx: usize,
        parent: &Moments,
    ) -> Option<SplitCandidate> {
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            self.features[a][feature_idx]
                .total_cmp(&self.features[b][feature_idx])
                .then(a.cmp(&b))
        });

        let min_leaf = self.config.min_samples_leaf;
        let parent_sse = parent.sse();
        let mut left = Moments::default();
        let mut best: Option<SplitCandidate> = None;

        for (rank, pair) in sorted.windows(2).enumerate() {
            left.push(self.targets[pair[0]]);

            let lo = self.features[pair[0]][feature_idx];
            let hi = self.features[pair[1]][feature_idx];
            if lo == hi {
                continue;
            }

            let right = parent.minus(&left);
            if left.count < min_leaf || right.count < min_leaf {
                continue;
            }

            let gain = parent_sse - left.sse() - right.sse();
            let candidate = SplitCandidate {
                feature_idx,
                threshold: midpoint(lo, hi),
                gain,
                tie_breaker: SplitTieBreaker::new(feature_idx, rank),
            };

            if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                best = Some(candidate);
            }
        }

        best
    }

    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .copied()
            .partition(|&idx| self.features[idx][feature_idx] <= threshold)
    }

    fn moments(&self, indices: &[usize]) -> Moments {
        let mut moments = Moments::default();
        for &idx in indices {
            moments.push(self.targets[idx]);
        }
        moments
    }
}

/// Cut point strictly below `hi`, so `lo` goes left and `hi` goes right
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi {
        mid
    } else {
        lo
    }
}
