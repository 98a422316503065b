//! Error types for CQL service

use cqlbridge_core::ProjectionError;
use thiserror::Error;

/// Result type for CQL operations
pub type CqlResult<T> = Result<T, CqlError>;

/// Errors that can occur during CQL operations
#[derive(Debug, Error)]
pub enum CqlError {
    /// Library not found on any search path
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    /// Library found but its content is unusable
    #[error("Invalid library content: {0}")]
    InvalidLibrary(String),

    /// CQL evaluation error
    #[error("CQL evaluation error: {0}")]
    EvaluationError(String),

    /// Operation timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Results could not be projected
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// HTTP transport error talking to the FHIR server
    #[error("FHIR server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reading a library file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
