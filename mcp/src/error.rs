//! Error types for the MCP server

use crate::protocol::JsonRpcError;
use pubdex_registry::RegistryError;
use serde::Serialize;
use thiserror::Error;

/// Result type for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// One field-level validation failure, carried on `-32602` responses
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// MCP server errors
#[derive(Debug, Error)]
pub enum McpError {
    /// Envelope shape wrong (invalid JSON-RPC)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Method does not exist
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Parameter binding or validation failed
    #[error("invalid parameters")]
    InvalidParams(Vec<FieldError>),

    /// Registry client failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The request was cancelled
    #[error("request cancelled")]
    Cancelled,

    /// Unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Single-field invalid-params helper
    pub fn invalid_param(field: impl Into<String>, message: impl Into<String>) -> Self {
        McpError::InvalidParams(vec![FieldError::new(field, message)])
    }

    /// Map onto the canonical JSON-RPC error set.
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self {
            McpError::Protocol(msg) => JsonRpcError::invalid_request(msg),
            McpError::MethodNotFound(method) => JsonRpcError::method_not_found(method),
            McpError::InvalidParams(errors) => JsonRpcError::invalid_params(
                serde_json::to_value(errors).unwrap_or_default(),
            ),
            McpError::Registry(e) => match e {
                RegistryError::InvalidInput(msg) => JsonRpcError::invalid_params(
                    serde_json::json!([{"field": "params", "message": msg}]),
                ),
                RegistryError::Unavailable { message, .. } => {
                    JsonRpcError::upstream_failure(message.clone())
                }
                RegistryError::RateLimited { retry_after_secs } => JsonRpcError::upstream_failure(
                    format!("HTTP 429 Too Many Requests, retry after {retry_after_secs}s"),
                ),
                RegistryError::Cancelled => JsonRpcError::cancelled(),
                // The canonical set has no not-found code; a clean human
                // message on -32603 names the missing resource.
                RegistryError::NotFound(what) => {
                    JsonRpcError::internal_error(format!("{what} was not found on pub.dev"))
                }
                RegistryError::Decode(msg) => {
                    JsonRpcError::internal_error(format!("upstream payload was malformed: {msg}"))
                }
            },
            McpError::Cancelled => JsonRpcError::cancelled(),
            McpError::Internal(msg) => JsonRpcError::internal_error(msg),
        }
    }

    /// The `rpc.status_code` span value for this outcome.
    pub fn status_code(&self) -> &'static str {
        match self {
            McpError::InvalidParams(_) => "INVALID_ARGUMENT",
            McpError::Cancelled | McpError::Registry(RegistryError::Cancelled) => "CANCELLED",
            McpError::Registry(
                RegistryError::Unavailable { .. } | RegistryError::RateLimited { .. },
            ) => "ERROR",
            _ => "EXCEPTION",
        }
    }
}

impl From<pubdex_model::ModelError> for McpError {
    fn from(e: pubdex_model::ModelError) -> Self {
        let message = match &e {
            pubdex_model::ModelError::Invalid { message, .. } => message.clone(),
            other => other.to_string(),
        };
        McpError::invalid_param(e.field().to_string(), message)
    }
}

impl From<serde_json::Error> for McpError {
    fn from(e: serde_json::Error) -> Self {
        McpError::Internal(format!("serialization failed: {e}"))
    }
}
