//! MCP (Model Context Protocol) server backed by the Toolhouse API.
//!
//! This crate implements an MCP server that exposes the tools of a Toolhouse
//! bundle: `tools/list` and `tools/call` requests arriving over stdio are
//! fulfilled by translating them into HTTP calls against the Toolhouse
//! tool-execution API and translating the responses back into MCP shapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpServer                                                  │
//! │  - JSON-RPC dispatch: initialize, tools/list, tools/call    │
//! └─────────────────────────────────────────────────────────────┘
//!        │                                        │
//!        ▼                                        ▼
//! ┌──────────────────────────┐   ┌─────────────────────────────┐
//! │  StdioTransport          │   │  ToolhouseClient            │
//! │  - Content-Length framed │   │  - POST /get_tools          │
//! │    JSON-RPC over stdio   │   │  - POST /run_tools          │
//! └──────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use toolhouse_mcp::{McpServer, StdioTransport, ToolhouseClient, ToolhouseConfig};
//!
//! let config = ToolhouseConfig::from_env()?;
//! let server = McpServer::new(ToolhouseClient::new(config)?);
//! let mut transport = StdioTransport::stdio();
//! server.serve(&mut transport).await?;
//! ```
//!
//! The server executes nothing locally, caches no tool definitions, and
//! retries no failed upstream call; it is a pure translation layer.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod upstream;

// Re-export main types
pub use config::ToolhouseConfig;
pub use error::{Result, ServerError};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, Tool, ToolContent,
    ToolsCapability,
};
pub use server::{McpServer, SERVER_NAME};
pub use transport::StdioTransport;
pub use upstream::ToolhouseClient;
