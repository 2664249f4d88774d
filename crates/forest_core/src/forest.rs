//! Random forest regression trainer
//!
//! Each tree is grown on its own bootstrap sample with a generator seeded
//! from `seed + tree index`, so the result does not depend on how rayon
//! schedules the trees.

use rayon::prelude::*;

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::LcgRng;
use crate::errors::{ForestError, Result};
use crate::model::ForestModel;
use crate::params::HyperparameterConfig;
use crate::tree::Tree;

/// Random forest regressor
#[derive(Clone, Debug)]
pub struct RandomForestRegressor {
    params: HyperparameterConfig,
}

impl RandomForestRegressor {
    pub fn new(params: HyperparameterConfig) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HyperparameterConfig {
        &self.params
    }

    /// Train a forest on a row-major feature matrix and its targets
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<ForestModel> {
        self.params.validate()?;
        let feature_count = check_inputs(x, y)?;
        let n_samples = x.len();

        let tree_config = TreeConfig {
            max_depth: self.params.tree_options.max_depth,
            min_samples_leaf: self.params.tree_options.min_num_samples,
            max_features: self.params.max_features.resolve(feature_count)?,
        };

        tracing::debug!(
            "Fitting {} trees on {} samples x {} features (max_features={})",
            self.params.n_estimators,
            n_samples,
            feature_count,
            tree_config.max_features
        );

        let builder = CartBuilder::new(x, y, tree_config);
        let seed = self.params.seed;
        let replacement = self.params.replacement;

        let trees: Vec<Tree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = LcgRng::for_tree(seed, tree_idx);
                let sample = rng.bootstrap_indices(n_samples, replacement);
                let tree = builder.build(&sample, &mut rng);
                tracing::trace!("Tree {} built with {} nodes", tree_idx, tree.nodes.len());
                tree
            })
            .collect();

        ForestModel::new(self.params.clone(), feature_count, n_samples, trees)
    }
}

/// Shape and value checks; returns the feature count
fn check_inputs(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(ForestError::EmptyInput);
    }
    if x.len() != y.len() {
        return Err(ForestError::ShapeMismatch(format!(
            "{} feature rows but {} targets",
            x.len(),
            y.len()
        )));
    }

    let feature_count = x[0].len();
    if feature_count == 0 {
        return Err(ForestError::ShapeMismatch("rows have no features".to_string()));
    }

    for (row, values) in x.iter().enumerate() {
        if values.len() != feature_count {
            return Err(ForestError::ShapeMismatch(format!(
                "row {} has {} features, expected {}",
                row,
                values.len(),
                feature_count
            )));
        }
        if let Some(column) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteValue { row, column });
        }
    }

    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(ForestError::NonFiniteValue {
            row,
            column: feature_count,
        });
    }

    Ok(feature_count)
}
