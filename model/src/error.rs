//! Error types for domain model construction

use thiserror::Error;

/// Result type for model construction and validation
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by validating constructors and parsers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A field failed its validation rule
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },

    /// A version string did not parse
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// A constraint expression did not parse
    #[error("invalid constraint '{0}'")]
    InvalidConstraint(String),
}

impl ModelError {
    /// Create a field validation error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field the error refers to
    pub fn field(&self) -> &str {
        match self {
            ModelError::Invalid { field, .. } => field,
            ModelError::InvalidVersion(_) => "version",
            ModelError::InvalidConstraint(_) => "constraint",
        }
    }
}
