//! MCP stdio server exposing the dataset tools.

/// JSON-RPC 2.0 protocol types.
pub mod protocol;
/// Newline-delimited stdio server loop.
pub mod server;

pub use protocol::{JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
