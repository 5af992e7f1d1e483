//! Integration tests for the Toolhouse MCP server.
//!
//! The Toolhouse API is mocked with wiremock; the framed server loop is
//! driven over an in-memory duplex stream.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::BufReader;
use toolhouse_mcp::{McpServer, StdioTransport, ToolhouseClient, ToolhouseConfig};
use uuid::Uuid;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_API_KEY: &str = "th-test-key";

fn expected_user_agent() -> String {
    format!(
        "Toolhouse/{} Rust/{}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION")
    )
}

fn test_config(mock: &MockServer) -> ToolhouseConfig {
    ToolhouseConfig::new(TEST_API_KEY).with_base_url(format!("{}/v1", mock.uri()))
}

fn server_for(config: ToolhouseConfig) -> McpServer {
    McpServer::new(ToolhouseClient::new(config).expect("client should build"))
}

async fn request(server: &McpServer, message: Value) -> toolhouse_mcp::JsonRpcResponse {
    server
        .handle_message(message)
        .await
        .expect("request should produce a response")
}

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tools_list_preserves_order_and_defaults_missing_fields() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/get_tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"function": {"name": "search", "description": "web search", "parameters": {"type": "object"}}},
            {"function": {"name": "scrape"}},
            {}
        ])))
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    let tools = response.result.unwrap()["tools"].clone();
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 3);

    assert_eq!(tools[0]["name"], "search");
    assert_eq!(tools[0]["description"], "web search");
    assert_eq!(tools[0]["inputSchema"], json!({"type": "object"}));

    assert_eq!(tools[1]["name"], "scrape");
    assert_eq!(tools[1]["description"], "");
    assert_eq!(tools[1]["inputSchema"], json!({}));

    assert_eq!(tools[2]["name"], "");
    assert_eq!(tools[2]["description"], "");
    assert_eq!(tools[2]["inputSchema"], json!({}));
}

#[tokio::test]
async fn tools_list_sends_required_headers_and_payload() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/get_tools"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", expected_user_agent().as_str()))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(body_json(json!({
            "bundle": "mcp-toolhouse",
            "metadata": {},
            "provider": "openai"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    // The mock only matches when every header and the exact body line up.
    assert!(!response.is_error());
    assert_eq!(response.result.unwrap()["tools"], json!([]));
}

#[tokio::test]
async fn tools_list_upstream_500_is_an_error_not_an_empty_list() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/get_tools"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    assert!(response.is_error());
    assert!(response.result.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert!(error.message.contains("500"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tools_call_returns_single_text_block() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", expected_user_agent().as_str()))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(body_partial_json(json!({
            "provider": "openai",
            "bundle": "mcp-toolhouse",
            "metadata": {},
            "content": {
                "type": "function",
                "function": {"name": "search", "arguments": {"q": "cats"}}
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": {"content": "3 results found"}})),
        )
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "search", "arguments": {"q": "cats"}}
        }),
    )
    .await;

    let content = response.result.unwrap()["content"].clone();
    let content = content.as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[0]["text"], "3 results found");
}

#[tokio::test]
async fn tools_call_empty_content_becomes_no_response() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {}})))
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "search", "arguments": {}}
        }),
    )
    .await;

    let content = response.result.unwrap()["content"].clone();
    assert_eq!(content.as_array().unwrap().len(), 1);
    assert_eq!(content[0]["text"], "no response");
}

#[tokio::test]
async fn tools_call_correlation_ids_are_fresh_uuids() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": {"content": "ok"}})),
        )
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    for id in 0..2 {
        let response = request(
            &server,
            json!({
                "jsonrpc": "2.0", "id": id, "method": "tools/call",
                "params": {"name": "search", "arguments": {}}
            }),
        )
        .await;
        assert!(!response.is_error());
    }

    let requests = mock.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let ids: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["content"]["id"].as_str().unwrap().to_string()
        })
        .collect();

    assert!(Uuid::parse_str(&ids[0]).is_ok());
    assert!(Uuid::parse_str(&ids[1]).is_ok());
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn tools_call_upstream_500_is_an_error() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .respond_with(ResponseTemplate::new(500).set_body_string("execution failed"))
        .mount(&mock)
        .await;

    let server = server_for(test_config(&mock));
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "search", "arguments": {}}
        }),
    )
    .await;

    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert!(error.message.contains("500"));
}

#[tokio::test]
async fn tools_call_times_out_when_upstream_stalls() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": {"content": "late"}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock)
        .await;

    let config = test_config(&mock).with_run_timeout(Duration::from_millis(200));
    let server = server_for(config);
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "slow", "arguments": {}}
        }),
    )
    .await;

    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert!(error.message.contains("timed out"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Framed end-to-end session
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn framed_session_initialize_list_call() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/get_tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"function": {"name": "search", "description": "web search", "parameters": {"type": "object"}}}
        ])))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/run_tools"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": {"content": "3 results found"}})),
        )
        .mount(&mock)
        .await;

    let (client_stream, server_stream) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_stream);
    let (client_read, client_write) = tokio::io::split(client_stream);

    let server = server_for(test_config(&mock));
    let server_task = tokio::spawn(async move {
        let mut transport = StdioTransport::new(BufReader::new(server_read), server_write);
        server.serve(&mut transport).await
    });

    let mut client = StdioTransport::new(BufReader::new(client_read), client_write);

    client
        .write_message(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "test", "version": "0"}}
        }))
        .await
        .unwrap();
    let init = client.read_message().await.unwrap().unwrap();
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "mcp-server-toolhouse");
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

    // Initialized notification produces no response; next read pairs with
    // the following request.
    client
        .write_message(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await
        .unwrap();

    client
        .write_message(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .await
        .unwrap();
    let list = client.read_message().await.unwrap().unwrap();
    assert_eq!(list["id"], 2);
    assert_eq!(list["result"]["tools"][0]["name"], "search");
    assert_eq!(list["result"]["tools"][0]["inputSchema"], json!({"type": "object"}));

    client
        .write_message(&json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "search", "arguments": {"q": "cats"}}
        }))
        .await
        .unwrap();
    let call = client.read_message().await.unwrap().unwrap();
    assert_eq!(call["id"], 3);
    assert_eq!(call["result"]["content"][0]["text"], "3 results found");

    client
        .write_message(&json!({"jsonrpc": "2.0", "id": 4, "method": "bogus/method"}))
        .await
        .unwrap();
    let err = client.read_message().await.unwrap().unwrap();
    assert_eq!(err["error"]["code"], -32601);

    // Closing the client side ends the serve loop cleanly.
    drop(client);
    server_task.await.unwrap().unwrap();
}
