//! Pipeline configuration
//!
//! Built once, before the pipeline starts, either from a TOML file or from
//! command-line flags, and passed down by reference.

use std::path::{Path, PathBuf};

use alm_forest_core::HyperparameterConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::features::ColumnSelection;

/// Everything one training run needs
///
/// Every key except `write_hash_file` is required when read from a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input CSV path
    pub source: PathBuf,
    /// Model output path
    pub destination: PathBuf,
    /// Also write `<destination>.blake3`
    #[serde(default)]
    pub write_hash_file: bool,
    pub columns: ColumnSelection,
    pub hyperparameters: HyperparameterConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("failed to serialize config: {}", e)))
    }

    /// Reject values no stage could work with
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("source", self.source.as_os_str().is_empty()),
            ("destination", self.destination.as_os_str().is_empty()),
            ("columns.target", self.columns.target.is_empty()),
            ("columns.start_feature", self.columns.start_feature.is_empty()),
            ("columns.end_feature", self.columns.end_feature.is_empty()),
        ];
        if let Some((key, _)) = named.iter().find(|(_, empty)| *empty) {
            return Err(PipelineError::Config(format!("{} must not be empty", key)));
        }

        self.hyperparameters
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}
