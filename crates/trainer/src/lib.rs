//! ALM Forest Trainer - offline random forest training pipeline
//!
//! Loads a CSV table, selects an inclusive range of feature columns and a
//! target column, drops rows that are not fully numeric, trains a tree
//! ensemble and writes the model to disk. Stages run strictly in order and
//! the first failure ends the run.

pub mod config;
pub mod dataset;
pub mod errors;
pub mod features;
pub mod persist;
pub mod trainer;

use std::path::PathBuf;

use tracing::{debug, info, warn};

pub use config::PipelineConfig;
pub use dataset::{Dataset, Record, Value};
pub use errors::{PipelineError, Stage};
pub use features::{extract_features, ColumnSelection, FeatureSet, FeatureStats};
pub use persist::{persist_model, write_hash_file, PersistedModel};
pub use trainer::{train_model, EnsembleTrainer, ForestTrainer, ModelHandle};

/// Summary of a successful run
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    pub rows_loaded: usize,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub feature_names: Vec<String>,
    pub destination: PathBuf,
    pub bytes_written: usize,
    /// BLAKE3 of the model bytes
    pub model_digest: String,
    pub hash_file: Option<PathBuf>,
}

/// Run the full pipeline with the built-in random forest.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    run_pipeline_with(&ForestTrainer, config)
}

/// Run the full pipeline with any tree-ensemble trainer.
pub fn run_pipeline_with<T: EnsembleTrainer>(
    trainer: &T,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    info!("Loading dataset from: {}", config.source.display());
    let dataset = Dataset::from_csv(&config.source)?;
    info!(
        "Loaded {} rows with {} columns",
        dataset.len(),
        dataset.header().len()
    );

    let features = extract_features(&dataset, &config.columns)?;
    if features.dropped_rows > 0 {
        warn!(
            "Dropped {} of {} rows ({:.1}%) with non-numeric features or target",
            features.dropped_rows,
            dataset.len(),
            100.0 * features.dropped_rows as f64 / dataset.len() as f64
        );
    }
    info!("Features: {}", features.names.join(", "));
    for stats in features.feature_stats() {
        debug!(
            "  {}: min={}, max={}, mean={:.4}",
            stats.name, stats.min, stats.max, stats.mean
        );
    }

    let model = train_model(trainer, &features, &config.hyperparameters)?;
    info!("Training complete");

    let persisted = persist_model(&model, &config.destination)?;
    let hash_file = if config.write_hash_file {
        Some(write_hash_file(&persisted)?)
    } else {
        None
    };

    Ok(PipelineReport {
        rows_loaded: dataset.len(),
        rows_used: features.len(),
        rows_dropped: features.dropped_rows,
        feature_names: features.names,
        destination: persisted.path,
        bytes_written: persisted.bytes_written,
        model_digest: persisted.digest,
        hash_file,
    })
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
