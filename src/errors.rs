//! Centralized error handling for voxel aggregation
//!
//! Every fallible operation in the crate returns [`Result`], so precondition
//! violations surface as one structured type instead of ad-hoc strings.

use thiserror::Error;

/// Main error type for aggregation runs
#[derive(Debug, Error)]
pub enum AggregateError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Fewer input volumes than the aggregation needs
    #[error("At least {required} input volumes are required, got {given}")]
    NotEnoughInputs { required: usize, given: usize },

    /// Input volume defined on a different grid than the first input
    #[error("Input volume '{name}' has different attributes than previous input volumes")]
    GeometryMismatch { name: String },

    /// Invalid argument value passed to a measure or the pipeline
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No input volume has any foreground voxel left after padding
    #[error("Neither input volume seems to have any foreground given padding value of {padding}")]
    NoForeground { padding: f64 },

    /// Unknown aggregation or normalization mode name
    #[error("Invalid {kind} mode: {value}")]
    InvalidMode { kind: &'static str, value: String },

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Generic error for anything without a dedicated variant
    #[error("{0}")]
    Generic(String),
}

impl AggregateError {
    /// Shorthand for [`AggregateError::InvalidArgument`]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<String> for AggregateError {
    fn from(error: String) -> Self {
        AggregateError::Generic(error)
    }
}

impl From<&str> for AggregateError {
    fn from(error: &str) -> Self {
        AggregateError::Generic(error.to_string())
    }
}

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, AggregateError>;
