//! Per-request observability: span, structured log line, audit digest

use crate::error::Result;
use crate::protocol::jsonrpc::{RequestId, CODE_UPSTREAM};
use pubdex_model::AuditLogEntry;
use serde_json::Value;
use std::future::Future;
use tracing::{info, info_span, warn, Instrument};

/// Wrap one tool execution in its `mcp.<tool>` span, emit the per-request
/// log line, and record the audit digests.
pub async fn observe<F>(
    tool: &str,
    id: Option<&RequestId>,
    params: &Value,
    run: F,
) -> Result<Value>
where
    F: Future<Output = Result<Value>>,
{
    let request_id = id.map(ToString::to_string);
    let span = info_span!(
        "mcp.tool",
        otel.name = %format!("mcp.{tool}"),
        rpc.system = "jsonrpc",
        rpc.method = %tool,
        rpc.request.id = tracing::field::Empty,
        rpc.status_code = tracing::field::Empty,
        rpc.error_code = tracing::field::Empty,
    );
    if let Some(request_id) = &request_id {
        span.record("rpc.request.id", request_id.as_str());
    }

    let started = std::time::Instant::now();
    let result = run.instrument(span.clone()).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(response) => {
            span.record("rpc.status_code", "OK");
            audit(tool, params, response);
            info!(
                target: "mcp.request",
                tool,
                request_id = request_id.as_deref(),
                status = "OK",
                duration_ms,
                "request completed"
            );
        }
        Err(error) => {
            let status = error.status_code();
            span.record("rpc.status_code", status);
            if status == "ERROR" {
                span.record("rpc.error_code", CODE_UPSTREAM);
            }
            audit(tool, params, &Value::String(error.to_string()));
            warn!(
                target: "mcp.request",
                tool,
                request_id = request_id.as_deref(),
                status,
                error = %error,
                duration_ms,
                "request failed"
            );
        }
    }

    result
}

/// Emit one audit record on the dedicated `audit` target.
fn audit(tool: &str, request: &Value, response: &Value) {
    let entry = AuditLogEntry::new(tool, request, response);
    info!(
        target: "audit",
        tool = %entry.tool(),
        timestamp = %entry.timestamp().to_rfc3339(),
        request_digest = %entry.request_digest(),
        response_digest = %entry.response_digest(),
        "tool execution audited"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;
    use serde_json::json;

    #[tokio::test]
    async fn test_observe_passes_result_through() {
        let value = observe(
            "search_packages",
            Some(&RequestId::Number(1)),
            &json!({"query": "http"}),
            async { Ok(json!({"ok": true})) },
        )
        .await
        .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_observe_passes_error_through() {
        let err = observe(
            "latest_version",
            None,
            &json!({}),
            async { Err(McpError::Internal("boom".to_string())) },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), "EXCEPTION");
    }
}
