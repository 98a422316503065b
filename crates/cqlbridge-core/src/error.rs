use thiserror::Error;

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors raised while projecting expression results.
///
/// Both variants are fatal for the request being projected: no partial
/// document is produced.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A value could not be encoded as JSON
    #[error("Serialization failure in expression '{expression}': {message}")]
    SerializationFailure { expression: String, message: String },

    /// A value reported an empty or unusable type tag
    #[error("Malformed type tag '{tag}' in expression '{expression}'")]
    MalformedTypeTag { expression: String, tag: String },
}

impl ProjectionError {
    pub fn serialization(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SerializationFailure {
            expression: expression.into(),
            message: message.into(),
        }
    }

    pub fn malformed_tag(expression: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::MalformedTypeTag {
            expression: expression.into(),
            tag: tag.into(),
        }
    }

    /// Name of the expression whose value failed to project
    pub fn expression(&self) -> &str {
        match self {
            Self::SerializationFailure { expression, .. }
            | Self::MalformedTypeTag { expression, .. } => expression,
        }
    }
}
