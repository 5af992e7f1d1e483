//! The MCP server loop: framed JSON-RPC in, Toolhouse HTTP out.
//!
//! One request is handled at a time; each handler suspends only while
//! awaiting its single upstream HTTP call. Operation failures surface as
//! JSON-RPC errors, never as empty results.

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JSONRPC_VERSION, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, MCP_PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolsCapability,
};
use crate::transport::StdioTransport;
use crate::upstream::ToolhouseClient;

/// Server name presented during capability negotiation.
pub const SERVER_NAME: &str = "mcp-server-toolhouse";

/// Result of dispatching one request: a payload or a protocol-level error.
type RpcResult<T> = std::result::Result<T, JsonRpcError>;

/// An MCP server that fulfills tool operations through the Toolhouse API.
pub struct McpServer {
    client: ToolhouseClient,
}

impl McpServer {
    /// Create a server around a configured upstream client.
    pub fn new(client: ToolhouseClient) -> Self {
        Self { client }
    }

    /// Run the request loop until the client closes the stream.
    pub async fn serve<R, W>(&self, transport: &mut StdioTransport<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = SERVER_NAME, bundle = %self.client.bundle(), "serving MCP over stdio");

        while let Some(message) = transport.read_message().await? {
            if let Some(response) = self.handle_message(message).await {
                transport.write_message(&response).await?;
            }
        }

        tracing::info!("client closed the stream, shutting down");
        Ok(())
    }

    /// Handle one inbound message; `None` means no response is owed.
    pub async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        // A message without a method is a client response; this server never
        // issues outbound requests, so there is nothing to correlate it with.
        if message.is_object() && message.get("method").is_none() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(format!("malformed request: {}", e)),
                ));
            }
        };

        match request.id {
            Some(id) if !id.is_null() => {
                if request.jsonrpc != JSONRPC_VERSION {
                    return Some(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
                    ));
                }

                let response = match self.dispatch(&request.method, request.params).await {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(err) => JsonRpcResponse::error(id, err),
                };
                Some(response)
            }
            _ => {
                // Notifications are never answered, even malformed ones.
                if request.jsonrpc != JSONRPC_VERSION {
                    tracing::debug!(method = %request.method, "dropping notification with bad jsonrpc version");
                } else {
                    self.handle_notification(&request.method);
                }
                None
            }
        }
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            other => tracing::debug!(method = %other, "ignoring unknown notification"),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> RpcResult<Value> {
        tracing::debug!(method = %method, "dispatching request");

        match method {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools().await,
            "tools/call" => self.call_tool(params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize_result(&self) -> Value {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        // Serialization of these fixed shapes cannot fail.
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    /// Discovery: re-fetch the full tool list and translate it in order.
    async fn list_tools(&self) -> RpcResult<Value> {
        let specs = self
            .client
            .get_tools()
            .await
            .map_err(|e| JsonRpcError::internal(e.to_string()))?;

        let result = ListToolsResult {
            tools: specs.into_iter().map(Into::into).collect(),
        };

        tracing::debug!(tool_count = result.tools.len(), "listed tools");
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
    }

    /// Invocation: forward the call and wrap the result in one text block.
    async fn call_tool(&self, params: Option<Value>) -> RpcResult<Value> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("invalid tools/call params: {}", e)))?;

        if params.name.is_empty() {
            return Err(JsonRpcError::invalid_params(
                "tools/call requires a non-empty 'name'",
            ));
        }

        let arguments = match params.arguments {
            None | Some(Value::Null) => json!({}),
            Some(args @ Value::Object(_)) => args,
            Some(_) => {
                return Err(JsonRpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        let response = self
            .client
            .run_tool(&params.name, arguments)
            .await
            .map_err(|e| {
                tracing::warn!(tool = %params.name, error = %e, "tool call failed");
                JsonRpcError::internal(e.to_string())
            })?;

        let result = CallToolResult::single_text(response.text_or_fallback());
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
    }
}
