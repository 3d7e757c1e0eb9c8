//! This module defines all error types used throughout the crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or empty function name at the entry point
    #[error("function name required")]
    Input,

    /// Function name not present in the handler table
    #[error("unknown function: {0}")]
    Dispatch(String),

    /// A precondition of the requested operation does not hold
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed bins or a failure while building the result
    #[error("internal error: {0}")]
    Internal(String),

    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record file parsing errors
    #[error("Record file error in {file:?}: {message}")]
    RecordFile { file: PathBuf, message: String },

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Rejections raised while validating a call against the current record state.
///
/// Every variant is raised before any mutation, so a rejected call leaves the
/// record untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record is locked")]
    Locked,

    #[error("index {index} out of range ({len} outputs)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("index {0} listed more than once")]
    DuplicateIndex(usize),

    #[error("no indices given")]
    EmptyIndices,

    #[error("output {0} is already spent")]
    AlreadySpent(usize),

    #[error("output {0} is not spent")]
    NotSpent(usize),

    #[error("output {0} is frozen")]
    Frozen(usize),

    #[error("output {0} is already frozen")]
    AlreadyFrozen(usize),

    #[error("output {0} is not frozen")]
    NotFrozen(usize),

    #[error("spent count mismatch: recorded {recorded}, actual {actual}")]
    SpentCountMismatch { recorded: u64, actual: u64 },

    #[error("invalid argument {position}: {message}")]
    InvalidArgument { position: usize, message: String },
}

/// Error classes visible to callers of the entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Dispatch,
    Validation,
    Internal,
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a dispatch error for an unknown function name
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::Dispatch(name.into())
    }

    /// Taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input => ErrorKind::Input,
            Error::Dispatch(_) => ErrorKind::Dispatch,
            Error::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// Check if the call was rejected by a precondition
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl ValidationError {
    pub fn invalid_argument(position: usize, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            position,
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Bail with an internal error message
#[macro_export]
macro_rules! bail_internal {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Internal(format!($($arg)*)))
    };
}
