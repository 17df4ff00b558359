//! MCP JSON-RPC protocol types.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::server::JSONRPC_VERSION;

/// JSON-RPC 2.0 request. A request without `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be `2.0`.
    pub jsonrpc: String,
    /// Request id; `None` only when the field is absent.
    #[serde(default, deserialize_with = "deserialize_present_id")]
    pub id: Option<JsonRpcId>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always `2.0`.
    pub jsonrpc: String,
    /// Id of the request being answered; `null` when it could not be read.
    pub id: Option<JsonRpcId>,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC ID (string, number, or null).
///
/// `Null` is an explicit `"id": null`, which still expects a response; an
/// absent `id` marks a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonRpcId {
    /// String id.
    String(String),
    /// Integer id.
    Number(i64),
    /// Explicit `null` id.
    Null,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> Result<Option<JsonRpcId>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonRpcId::deserialize(deserializer).map(Some)
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code from `error_codes`.
    pub code: i32,
    /// Short description.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonRpcId>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonRpcId>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Request line is not valid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Request is not a valid JSON-RPC 2.0 object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Missing or unknown tool name.
    pub const INVALID_PARAMS: i32 = -32602;
}

/// MCP method names.
pub mod methods {
    /// Handshake request.
    pub const INITIALIZE: &str = "initialize";
    /// Client notification sent after the handshake.
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Liveness check.
    pub const PING: &str = "ping";
    /// Stops the server loop after responding.
    pub const SHUTDOWN: &str = "shutdown";
    /// Lists tool definitions.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Runs one tool.
    pub const TOOLS_CALL: &str = "tools/call";
}
