//! # pubdex MCP server
//!
//! Model Context Protocol server over the pub.dev registry. Exposes eight
//! tools through a JSON-RPC 2.0 pipeline served over line-delimited stdio
//! or HTTP.
//!
//! ## Architecture
//!
//! - **Protocol layer**: JSON-RPC 2.0 envelope types and the stdio transport
//! - **Server layer**: payload pipeline, tool descriptor registry, HTTP
//!   transport with health probes
//! - **Handler layer**: the eight tool implementations, including the
//!   compatibility solver and the dependency-graph builder
//! - **Observability**: per-request span, structured log line, audit digest

pub mod context;
pub mod error;
pub mod handlers;
pub mod observe;
pub mod protocol;
pub mod server;

pub use context::ToolContext;
pub use error::{FieldError, McpError, Result};
pub use protocol::{serve_stdio, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use server::http::{router, serve_http};
pub use server::{McpServer, ServerConfig, ToolRegistry};
