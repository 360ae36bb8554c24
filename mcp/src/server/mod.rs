//! MCP server: the JSON-RPC pipeline
//!
//! Parses raw payloads, validates envelopes, routes to tool descriptors,
//! and shapes success and error responses. Batches execute concurrently
//! with responses collected in request order; notifications never produce
//! a response past envelope validation.

pub mod http;
pub mod tools;

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use crate::observe;
use crate::protocol::jsonrpc::{JsonRpcError, JsonRpcResponse, RequestId};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use tools::{ToolDescriptor, ToolRegistry};

/// MCP protocol revision answered on `initialize`
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server identity configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "pubdex".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP server
pub struct McpServer {
    context: Arc<ToolContext>,
    tools: ToolRegistry,
    config: ServerConfig,
}

impl McpServer {
    pub fn new(context: Arc<ToolContext>, config: ServerConfig) -> Self {
        info!(
            server = %config.name,
            version = %config.version,
            "MCP server initialized"
        );
        Self {
            context,
            tools: ToolRegistry::new(),
            config,
        }
    }

    pub fn context(&self) -> &Arc<ToolContext> {
        &self.context
    }

    /// Process one raw payload (single request or batch). Returns the JSON
    /// to send back, or `None` when nothing must be sent (notifications).
    pub async fn handle_payload(&self, raw: &str, cancel: &CancellationToken) -> Option<Value> {
        let parsed: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "payload failed to parse");
                return Some(encode(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(),
                )));
            }
        };

        match parsed {
            Value::Array(items) => {
                if items.is_empty() {
                    return Some(encode(JsonRpcResponse::error(
                        None,
                        JsonRpcError::invalid_request("batch must not be empty"),
                    )));
                }

                // Elements run concurrently; join_all preserves request
                // order in the collected responses.
                let outcomes = join_all(
                    items
                        .into_iter()
                        .map(|item| self.handle_value(item, cancel)),
                )
                .await;

                let responses: Vec<Value> =
                    outcomes.into_iter().flatten().map(encode).collect();
                if responses.is_empty() {
                    None
                } else {
                    Some(Value::Array(responses))
                }
            }
            single => self.handle_value(single, cancel).await.map(encode),
        }
    }

    /// Process one request value through envelope validation and dispatch.
    async fn handle_value(
        &self,
        value: Value,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let id = extract_id(&value);

        let Some(object) = value.as_object() else {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("request must be an object"),
            ));
        };

        if object.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        let method = match object.get("method").and_then(Value::as_str) {
            Some(method) if !method.is_empty() => method.to_string(),
            _ => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request("method must be a non-empty string"),
                ));
            }
        };

        // An `"id": null` identifies the request (echoed back as null);
        // only a missing key makes a notification.
        let identified = object.contains_key("id");

        let params = object.get("params").cloned();
        let result = self.dispatch(&method, params, id.as_ref(), cancel).await;

        if !identified {
            // Notification: outcomes are dropped silently.
            if let Err(e) = result {
                debug!(method = %method, error = %e, "notification failed");
            }
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err(e) => JsonRpcResponse::error(id, e.to_jsonrpc()),
        })
    }

    /// Route a validated request to a pipeline method or tool descriptor.
    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
        id: Option<&RequestId>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        match method {
            "initialize" => Ok(self.initialize()),
            "tools/list" => Ok(self.list_tools()),
            _ => {
                let descriptor = self
                    .tools
                    .get(method)
                    .ok_or_else(|| McpError::MethodNotFound(method.to_string()))?;

                let params = match params {
                    None => json!({}),
                    Some(params @ Value::Object(_)) => params,
                    Some(_) => {
                        return Err(McpError::invalid_param(
                            "params",
                            "params must be an object",
                        ));
                    }
                };

                observe::observe(
                    method,
                    id,
                    &params,
                    descriptor.execute(&self.context, params.clone(), cancel),
                )
                .await
            }
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version,
            }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }
}

fn encode(response: JsonRpcResponse) -> Value {
    serde_json::to_value(&response).unwrap_or_else(|_| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32603, "message": "Internal error: response encoding failed" }
        })
    })
}

/// Pull a usable request id out of a raw value. `None` covers a missing
/// key, an explicit `null`, and unusable id types alike; whether the key
/// was present at all (notification or not) is judged separately.
fn extract_id(value: &Value) -> Option<RequestId> {
    match value.get("id") {
        Some(Value::String(s)) => Some(RequestId::String(s.clone())),
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Number),
        _ => None,
    }
}
