//! HTTP client for the Toolhouse tool-execution API.
//!
//! Two endpoints back the whole server: `POST /get_tools` enumerates the
//! tools in the configured bundle, `POST /run_tools` executes one of them.
//! Tool definitions are fetched fresh on every discovery call and results
//! are never cached; failed calls are never retried here.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ToolhouseConfig;
use crate::error::{Result, ServerError};
use crate::protocol::Tool;

/// Provider tag sent with every upstream call.
const PROVIDER: &str = "openai";

/// Substituted when an invocation succeeds but carries no content.
/// A data-shaping policy, not an error.
pub const NO_RESPONSE_FALLBACK: &str = "no response";

/// User-agent advertised to the Toolhouse API.
fn user_agent() -> String {
    format!(
        "Toolhouse/{} Rust/{}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION")
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the discovery endpoint.
#[derive(Debug, Serialize)]
struct GetToolsRequest<'a> {
    bundle: &'a str,
    metadata: Value,
    provider: &'a str,
}

/// One tool definition as the Toolhouse API describes it.
///
/// Every field is optional on the wire; missing pieces are substituted with
/// empty strings and an empty schema object during translation.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteToolSpec {
    /// The nested function object; an empty one stands in when absent.
    #[serde(default)]
    pub function: RemoteFunction,
}

/// The `function` object nested in a [`RemoteToolSpec`].
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFunction {
    /// Tool name.
    #[serde(default)]
    pub name: String,
    /// Tool description.
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default = "empty_object")]
    pub parameters: Value,
}

impl Default for RemoteFunction {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            parameters: empty_object(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl From<RemoteToolSpec> for Tool {
    fn from(spec: RemoteToolSpec) -> Self {
        Tool {
            name: spec.function.name,
            description: spec.function.description,
            input_schema: spec.function.parameters,
        }
    }
}

/// Request body for the invocation endpoint.
#[derive(Debug, Serialize)]
struct RunToolsRequest<'a> {
    provider: &'a str,
    bundle: &'a str,
    metadata: Value,
    content: FunctionCall<'a>,
}

/// The function-call envelope the invocation endpoint expects.
#[derive(Debug, Serialize)]
struct FunctionCall<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    /// Fresh correlation id per invocation, for upstream tracking only.
    id: String,
    function: FunctionInvocation<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionInvocation<'a> {
    name: &'a str,
    arguments: Value,
}

/// Response body of the invocation endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunToolsResponse {
    /// Result payload; tolerated when absent.
    #[serde(default)]
    pub content: RunToolsContent,
}

/// The nested `content` object of a [`RunToolsResponse`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunToolsContent {
    /// Textual result of the tool run, when the tool produced one.
    #[serde(default)]
    pub content: Option<String>,
}

impl RunToolsResponse {
    /// The result text, with missing, null, or empty content collapsed to
    /// the [`NO_RESPONSE_FALLBACK`] literal.
    pub fn text_or_fallback(self) -> String {
        match self.content.content {
            Some(text) if !text.is_empty() => text,
            _ => NO_RESPONSE_FALLBACK.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Toolhouse API.
///
/// Holds the shared connection pool and the immutable process configuration;
/// carries no per-call state.
#[derive(Debug)]
pub struct ToolhouseClient {
    client: reqwest::Client,
    config: ToolhouseConfig,
}

impl ToolhouseClient {
    /// Create a client from validated configuration.
    pub fn new(config: ToolhouseConfig) -> Result<Self> {
        config.validate()?;

        let _parsed = url::Url::parse(&config.base_url)
            .map_err(|e| ServerError::config(format!("invalid TOOLHOUSE_BASE_URL: {}", e)))?;

        // Per-request timeouts only; discovery deliberately inherits the
        // client default unless configured.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ServerError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The bundle identifier this client queries.
    pub fn bundle(&self) -> &str {
        &self.config.bundle
    }

    fn get_tools_url(&self) -> String {
        format!("{}/get_tools", self.config.base_url)
    }

    fn run_tools_url(&self) -> String {
        format!("{}/run_tools", self.config.base_url)
    }

    /// The three headers attached to every outbound request.
    ///
    /// Rebuilt per call rather than cached; pure over the configured
    /// credential so tests can assert the exact values.
    pub(crate) fn common_headers(&self) -> [(HeaderName, String); 3] {
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (USER_AGENT, user_agent()),
            (AUTHORIZATION, format!("Bearer {}", self.config.api_key)),
        ]
    }

    fn add_headers(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        for (name, value) in self.common_headers() {
            builder = builder.header(name, value);
        }
        builder
    }

    /// Fetch the full tool list for the configured bundle.
    ///
    /// Order of the returned specs matches the upstream response; nothing is
    /// sorted, filtered, or deduplicated.
    pub async fn get_tools(&self) -> Result<Vec<RemoteToolSpec>> {
        let body = GetToolsRequest {
            bundle: &self.config.bundle,
            metadata: empty_object(),
            provider: PROVIDER,
        };

        let mut request = self.add_headers(self.client.post(self.get_tools_url()).json(&body));
        if let Some(timeout) = self.config.list_timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(bundle = %self.config.bundle, "fetching tool list");

        let response = request.send().await?;
        let response = Self::check_status(response).await?;

        let specs: Vec<RemoteToolSpec> = response.json().await.map_err(|e| {
            ServerError::protocol(format!("malformed get_tools response: {}", e))
        })?;

        tracing::debug!(tool_count = specs.len(), "fetched tool list");
        Ok(specs)
    }

    /// Execute a named tool with the given arguments.
    ///
    /// A fresh correlation id is generated per call; arguments are forwarded
    /// verbatim without schema validation.
    pub async fn run_tool(&self, name: &str, arguments: Value) -> Result<RunToolsResponse> {
        let correlation_id = Uuid::new_v4().to_string();
        let body = RunToolsRequest {
            provider: PROVIDER,
            bundle: &self.config.bundle,
            metadata: empty_object(),
            content: FunctionCall {
                kind: "function",
                id: correlation_id.clone(),
                function: FunctionInvocation { name, arguments },
            },
        };

        tracing::debug!(
            tool = %name,
            correlation_id = %correlation_id,
            "running tool"
        );

        let response = self
            .add_headers(self.client.post(self.run_tools_url()).json(&body))
            .timeout(self.config.run_timeout)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let result: RunToolsResponse = response.json().await.map_err(|e| {
            ServerError::protocol(format!("malformed run_tools response: {}", e))
        })?;

        Ok(result)
    }

    /// Turn a non-2xx response into an error carrying the status code.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "upstream request failed");
        Err(ServerError::upstream_status(status.as_u16(), body))
    }
}
