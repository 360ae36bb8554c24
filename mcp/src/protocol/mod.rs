//! JSON-RPC protocol layer: envelope types and the stdio transport

pub mod jsonrpc;
pub mod transport;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use transport::serve_stdio;
