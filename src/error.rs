//! This module defines all error types used throughout the compiler.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the compiler
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed statechart tree: broken parent chains, missing or
    /// duplicated initial states, dangling transition endpoints
    #[error("Structural error: {0}")]
    Structural(String),

    /// Construct the compiler recognizes but cannot encode
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A region or id does not fit the selected slot width
    #[error("Encoding overflow in {region}: {count} exceeds slot limit {limit}")]
    EncodingOverflow {
        region: String,
        count: usize,
        limit: usize,
    },

    /// Chart document parsing errors
    #[error("Document error in {file:?}: {message}")]
    Document { file: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    UnsupportedConstruct,
    EncodingOverflow,
    Input,
    Other,
}

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a structural error
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(msg.into())
    }

    /// Create a document error for the given file
    pub fn document(file: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Document {
            file: file.into(),
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Structural(_) => ErrorKind::Structural,
            Error::UnsupportedConstruct(_) => ErrorKind::UnsupportedConstruct,
            Error::EncodingOverflow { .. } => ErrorKind::EncodingOverflow,
            Error::Io(_) | Error::Document { .. } | Error::Config(_) => ErrorKind::Input,
            Error::Custom(_) | Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if error aborts compilation of a chart
    pub fn is_fatal_compile_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Structural | ErrorKind::UnsupportedConstruct | ErrorKind::EncodingOverflow
        )
    }
}

// Implement From traits for common external error types

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Document {
            file: PathBuf::from("unknown"),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Document {
            file: PathBuf::from("unknown"),
            message: format!("JSON error: {}", err),
        }
    }
}

// Helper macros for creating errors

/// Create a structural error with formatting
#[macro_export]
macro_rules! structural_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Structural(format!($($arg)*))
    };
}

/// Create an unsupported-construct error with formatting
#[macro_export]
macro_rules! unsupported_error {
    ($($arg:tt)*) => {
        $crate::error::Error::UnsupportedConstruct(format!($($arg)*))
    };
}

/// Ensure a condition is true or return the given error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}
