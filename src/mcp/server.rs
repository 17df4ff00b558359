use std::io::{self, BufRead, Write};

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::constants::server::{JSONRPC_VERSION, PROTOCOL_VERSION, SERVER_NAME};
use crate::tools::{ToolRouter, definitions};

use super::protocol::{JsonRpcRequest, JsonRpcResponse, error_codes, methods};

/// Stdio MCP server dispatching JSON-RPC requests to a `ToolRouter`.
///
/// Requests are handled one at a time in arrival order.
pub struct McpServer {
    router: ToolRouter,
}

impl McpServer {
    /// Create a server over `router`.
    pub fn new(router: ToolRouter) -> Self {
        Self { router }
    }

    /// Serve newline-delimited JSON-RPC on the process stdin/stdout.
    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Serve newline-delimited JSON-RPC from `input` to `output` until EOF or `shutdown`.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        info!("[emotion:mcp] server ready, reading requests");
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    error!("[emotion:mcp] error reading input: {err}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            debug!("[emotion:mcp] received: {}", line);
            let (response, shutdown) = self.handle_line(&line);
            if let Some(response) = response {
                let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
                debug!("[emotion:mcp] sending: {}", encoded);
                writeln!(output, "{encoded}")?;
                output.flush()?;
            }
            if shutdown {
                break;
            }
        }
        info!("[emotion:mcp] server shutting down");
        Ok(())
    }

    /// Handle one raw request line.
    ///
    /// Returns the response to write (none for notifications) and whether the
    /// client asked to shut down.
    pub fn handle_line(&self, line: &str) -> (Option<JsonRpcResponse>, bool) {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!("[emotion:mcp] failed to parse request: {err}");
                return (
                    Some(JsonRpcResponse::error(
                        None,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {err}"),
                    )),
                    false,
                );
            }
        };
        let shutdown = request.method == methods::SHUTDOWN;
        (self.handle_request(request), shutdown)
    }

    /// Dispatch a parsed request.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        let Some(id) = request.id else {
            debug!("[emotion:mcp] notification {} handled", request.method);
            return None;
        };
        let id = Some(id);

        let response = match request.method.as_str() {
            methods::INITIALIZE => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            ),
            methods::PING | methods::SHUTDOWN => JsonRpcResponse::success(id, json!({})),
            methods::TOOLS_LIST => JsonRpcResponse::success(id, json!({ "tools": definitions() })),
            methods::TOOLS_CALL => self.handle_tools_call(id, request.params.as_ref()),
            other => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };
        Some(response)
    }

    fn handle_tools_call(
        &self,
        id: Option<super::JsonRpcId>,
        params: Option<&Value>,
    ) -> JsonRpcResponse {
        let Some(name) = params
            .and_then(|params| params.get("name"))
            .and_then(Value::as_str)
        else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "tools/call requires a string 'name'",
            );
        };
        let arguments = params.and_then(|params| params.get("arguments"));

        match self.router.call(name, arguments) {
            Some(text) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": false,
                }),
            ),
            None => JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown tool: {name}"),
            ),
        }
    }
}
