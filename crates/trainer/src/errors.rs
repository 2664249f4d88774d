use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by errors raised outside this crate
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Pipeline stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Extract,
    Train,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Extract => "extract",
            Stage::Train => "train",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Errors returned by the training pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input: {0}")]
    Format(String),

    #[error("column(s) not found in header: {}", .columns.join(", "))]
    ColumnNotFound { columns: Vec<String> },

    #[error(
        "start column '{start}' (position {start_index}) comes after end column '{end}' (position {end_index})"
    )]
    InvalidRange {
        start: String,
        end: String,
        start_index: usize,
        end_index: usize,
    },

    #[error("no valid rows: all {rows} rows contain non-numeric features or target")]
    NoValidData { rows: usize },

    #[error("training failed: {0}")]
    Training(#[source] BoxError),

    #[error("model serialization failed: {0}")]
    Serialization(#[source] BoxError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, stage: Stage, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            stage,
            source,
        }
    }

    /// Stage the error was raised in
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Io { stage, .. } => *stage,
            PipelineError::Format(_) => Stage::Load,
            PipelineError::ColumnNotFound { .. }
            | PipelineError::InvalidRange { .. }
            | PipelineError::NoValidData { .. } => Stage::Extract,
            PipelineError::Training(_) => Stage::Train,
            PipelineError::Serialization(_) => Stage::Persist,
            PipelineError::Config(_) => Stage::Config,
        }
    }

    /// Error kind name used when reporting
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Io { .. } => "IOError",
            PipelineError::Format(_) => "FormatError",
            PipelineError::ColumnNotFound { .. } => "ColumnNotFoundError",
            PipelineError::InvalidRange { .. } => "InvalidRangeError",
            PipelineError::NoValidData { .. } => "NoValidDataError",
            PipelineError::Training(_) => "TrainingError",
            PipelineError::Serialization(_) => "SerializationError",
            PipelineError::Config(_) => "ConfigError",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_kind() {
        let err = PipelineError::ColumnNotFound {
            columns: vec!["ALM".to_string(), "Age".to_string()],
        };
        assert_eq!(err.stage(), Stage::Extract);
        assert_eq!(err.kind(), "ColumnNotFoundError");
        assert_eq!(err.to_string(), "column(s) not found in header: ALM, Age");

        let err = PipelineError::io(
            "/missing/model.json",
            Stage::Persist,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.stage(), Stage::Persist);
        assert_eq!(err.kind(), "IOError");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_training_error_keeps_cause() {
        let cause: BoxError = "bad shapes".into();
        let err = PipelineError::Training(cause);
        assert_eq!(err.stage(), Stage::Train);
        assert_eq!(err.source().map(|s| s.to_string()), Some("bad shapes".to_string()));
    }
}
