//! Error types for the ABDMF framework

use thiserror::Error;

/// Result type alias for ABDMF operations
pub type Result<T> = std::result::Result<T, AbdmfError>;

/// Broad class of a failure, used by callers deciding whether to retry with
/// corrected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong shape, missing columns/fields, out-of-range values
    Input,
    /// Operation called in the wrong lifecycle state
    State,
    /// I/O, serialization or data-engine failure
    Internal,
}

/// Main error type for the framework
#[derive(Error, Debug)]
pub enum AbdmfError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Missing features: {0:?}")]
    MissingFeatures(Vec<String>),

    #[error("Invalid user type: {0}")]
    InvalidUserType(String),

    #[error("Invalid feedback category: {0}")]
    InvalidCategory(String),

    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<String>),

    #[error("Invalid satisfaction score {score}. Must be between {min} and {max}")]
    SatisfactionOutOfRange { score: f64, min: f64, max: f64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model needs to be trained before {0}")]
    ModelNotTrained(&'static str),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AbdmfError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AbdmfError::InvalidInput(_)
            | AbdmfError::EmptyDataset
            | AbdmfError::MissingColumns(_)
            | AbdmfError::MissingFeatures(_)
            | AbdmfError::InvalidUserType(_)
            | AbdmfError::InvalidCategory(_)
            | AbdmfError::MissingFields(_)
            | AbdmfError::SatisfactionOutOfRange { .. }
            | AbdmfError::ConfigError(_)
            | AbdmfError::ShapeError { .. } => ErrorKind::Input,
            AbdmfError::ModelNotTrained(_) => ErrorKind::State,
            AbdmfError::TrainingError(_)
            | AbdmfError::DataError(_)
            | AbdmfError::SerializationError(_)
            | AbdmfError::IoError(_) => ErrorKind::Internal,
        }
    }
}

impl From<polars::error::PolarsError> for AbdmfError {
    fn from(err: polars::error::PolarsError) -> Self {
        AbdmfError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AbdmfError {
    fn from(err: serde_json::Error) -> Self {
        AbdmfError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AbdmfError {
    fn from(err: serde_yaml::Error) -> Self {
        AbdmfError::ConfigError(err.to_string())
    }
}

impl From<bincode::Error> for AbdmfError {
    fn from(err: bincode::Error) -> Self {
        AbdmfError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AbdmfError {
    fn from(err: ndarray::ShapeError) -> Self {
        AbdmfError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
