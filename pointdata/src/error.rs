//! Error types for matrix storage operations

use pointdata_core::CoreError;
use thiserror::Error;

/// Errors that can occur while building, converting or persisting matrices
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Structural or numeric error from the core layer
    #[error("{0}")]
    Core(CoreError),

    /// The active storage does not support the operation
    #[error("{operation} is not supported for {storage} storage")]
    UnsupportedOperation {
        operation: &'static str,
        storage: &'static str,
    },

    /// The (storage, element) pair is not one of the supported cases
    #[error("No matrix case matches configuration {storage}<{element}>")]
    ConfigurationMismatch { storage: String, element: String },

    /// A required document field is absent
    #[error("{0} not found in document")]
    MissingField(&'static str),

    /// A document field has the wrong type or inconsistent contents
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Base64 block payload failed to decode
    #[error("Block decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Worker pool construction failed
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl MatrixError {
    /// Create an UnsupportedOperation error
    pub fn unsupported(operation: &'static str, storage: &'static str) -> Self {
        Self::UnsupportedOperation { operation, storage }
    }

    /// Create a ConfigurationMismatch error
    pub fn configuration_mismatch(storage: impl Into<String>, element: impl Into<String>) -> Self {
        Self::ConfigurationMismatch {
            storage: storage.into(),
            element: element.into(),
        }
    }

    /// Create a MalformedDocument error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }
}

impl From<CoreError> for MatrixError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

/// Result type for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;
