//! Training orchestration
//!
//! The pipeline talks to the regression algorithm only through
//! [`EnsembleTrainer`] and [`ModelHandle`]; [`ForestTrainer`] is the
//! in-process random forest implementation.

use alm_forest_core::{ForestError, ForestModel, HyperparameterConfig, RandomForestRegressor};
use tracing::info;

use crate::errors::{BoxError, PipelineError, Result};
use crate::features::FeatureSet;

/// A trained model that can be turned into bytes for storage
pub trait ModelHandle {
    fn serialize(&self) -> std::result::Result<Vec<u8>, BoxError>;
}

/// Tree-ensemble regression capability
pub trait EnsembleTrainer {
    type Model: ModelHandle;
    type Error: std::error::Error + Send + Sync + 'static;

    fn train(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        config: &HyperparameterConfig,
    ) -> std::result::Result<Self::Model, Self::Error>;
}

/// Deterministic random forest from `alm-forest-core`
#[derive(Clone, Copy, Debug, Default)]
pub struct ForestTrainer;

impl EnsembleTrainer for ForestTrainer {
    type Model = ForestModel;
    type Error = ForestError;

    fn train(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        config: &HyperparameterConfig,
    ) -> std::result::Result<ForestModel, ForestError> {
        RandomForestRegressor::new(config.clone()).fit(x, y)
    }
}

impl ModelHandle for ForestModel {
    /// Canonical JSON, so equal models always produce equal bytes
    fn serialize(&self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(self.to_canonical_json()?.into_bytes())
    }
}

/// Submit the cleaned data to the trainer unchanged and wrap any failure.
pub fn train_model<T: EnsembleTrainer>(
    trainer: &T,
    features: &FeatureSet,
    config: &HyperparameterConfig,
) -> Result<T::Model> {
    info!(
        "Training on {} samples x {} features (seed={}, estimators={}, max_depth={}, min_samples={})",
        features.len(),
        features.names.len(),
        config.seed,
        config.n_estimators,
        config.tree_options.max_depth,
        config.tree_options.min_num_samples
    );

    trainer
        .train(&features.matrix, &features.targets, config)
        .map_err(|err| PipelineError::Training(Box::new(err)))
}
