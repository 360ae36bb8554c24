//! Registry error taxonomy

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors surfaced by the registry client
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Caller-side input fault; never retried
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream could not serve the call, including after resilience
    /// exhaustion. `status` is the last HTTP status, absent for
    /// transport-level failures.
    #[error("upstream unavailable: {message}")]
    Unavailable { status: Option<u16>, message: String },

    /// The package or publisher does not exist upstream
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream returned 429 through the whole retry budget
    #[error("rate limited by upstream, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Upstream payload did not match the expected shape
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request was cancelled before completion
    #[error("request cancelled")]
    Cancelled,
}

impl RegistryError {
    /// Build an `Unavailable` from an HTTP status line.
    pub fn unavailable_status(status: u16, line: impl Into<String>) -> Self {
        RegistryError::Unavailable {
            status: Some(status),
            message: line.into(),
        }
    }

    /// Build an `Unavailable` for a transport-level failure.
    pub fn unavailable_transport(message: impl Into<String>) -> Self {
        RegistryError::Unavailable {
            status: None,
            message: message.into(),
        }
    }

    /// Whether a retry might help: transport faults, timeouts, 408, 429, 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::RateLimited { .. } => true,
            RegistryError::Unavailable { status, .. } => match status {
                None => true,
                Some(408) => true,
                Some(code) => *code >= 500,
            },
            _ => false,
        }
    }
}
