//! HTTP transport: `POST /rpc` plus liveness and readiness probes

use crate::server::McpServer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pubdex_registry::RegistryError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared handler state: the server plus the transport's shutdown token,
/// from which every request derives its own cancellation token.
#[derive(Clone)]
struct HttpState {
    server: Arc<McpServer>,
    shutdown: CancellationToken,
}

/// Build the HTTP router over a shared server. Request handlers cancel when
/// `shutdown` fires, aborting in-flight upstream calls.
pub fn router(server: Arc<McpServer>, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/rpc", post(rpc))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .with_state(HttpState { server, shutdown })
}

/// Bind and serve until cancellation.
pub async fn serve_http(
    server: Arc<McpServer>,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "MCP server listening on http");

    let shutdown = cancel.clone();
    axum::serve(listener, router(server, cancel))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn rpc(State(state): State<HttpState>, body: String) -> Response {
    if body.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "empty body").into_response();
    }

    let cancel = state.shutdown.child_token();
    match state.server.handle_payload(&body, &cancel).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Liveness: unconditionally 200 while the process serves.
async fn live() -> &'static str {
    "live"
}

/// Readiness: probe the upstream search endpoint. A rate-limited upstream
/// still counts as serving, flagged as degraded.
async fn ready(State(state): State<HttpState>) -> Response {
    let cancel = state.shutdown.child_token();
    let probe = state
        .server
        .context()
        .registry
        .search("http", false, None, &cancel)
        .await;

    match probe {
        // A not-found result still proves the upstream answered.
        Ok(_) | Err(RegistryError::NotFound(_)) => {
            (StatusCode::OK, "ready").into_response()
        }
        Err(RegistryError::RateLimited { .. }) => (StatusCode::OK, "degraded").into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("upstream probe failed: {e}"),
        )
            .into_response(),
    }
}
