use thiserror::Error;

/// Errors returned by the forest trainer and model artifacts.
#[derive(Debug, Error)]
pub enum ForestError {
    #[error("invalid hyperparameters: {0}")]
    InvalidParameters(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("training set is empty")]
    EmptyInput,

    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteValue { row: usize, column: usize },

    #[error("model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForestError>;
