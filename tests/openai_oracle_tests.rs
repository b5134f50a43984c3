#![cfg(feature = "openai")]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use delve::config::AgentConfig;
use delve::error::{ConfigError, OracleError};
use delve::oracle::openai::OpenAiOracle;
use delve::oracle::{create_oracle, OracleRequest, ReasoningOracle};
use delve::tools::{ToolDescriptor, ToolParameters};
use delve::types::Message;

fn oracle(server: &MockServer) -> OpenAiOracle {
    OpenAiOracle::new("gpt-4o-mini", "sk-test", format!("{}/v1", server.uri()))
}

fn search_descriptor() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::new(
        "web_search",
        "Search the web",
        ToolParameters::object().string("query", "The search query", true).build(),
    )]
}

fn conversation() -> Vec<Message> {
    vec![Message::system("You research."), Message::user("capital of France")]
}

#[tokio::test]
async fn parses_tool_calls_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "tool_choice": "auto",
            "tools": [{"type": "function", "function": {"name": "web_search"}}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "web_search", "arguments": "{\"query\":\"France capital\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = conversation();
    let tools = search_descriptor();
    let response = oracle(&server)
        .respond(&OracleRequest::new(&messages, &tools))
        .await
        .unwrap();

    assert_eq!(response.text, "");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_1");
    assert_eq!(response.tool_calls[0].name, "web_search");
    assert_eq!(response.tool_calls[0].arguments, json!({"query": "France capital"}));
    assert_eq!(response.usage.total_tokens, 19);
}

#[tokio::test]
async fn final_text_request_offers_no_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Paris"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = conversation();
    let response = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap();
    assert_eq!(response.text, "Paris");
    assert!(response.tool_calls.is_empty());

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
    assert_eq!(body["messages"][0], json!({"role": "system", "content": "You research."}));
    assert_eq!(body["messages"][1], json!({"role": "user", "content": "capital of France"}));
}

#[tokio::test]
async fn undecodable_arguments_are_kept_as_raw_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"tool_calls": [{
                "id": "call_x",
                "type": "function",
                "function": {"name": "web_search", "arguments": "{\"query\": "}
            }]}}]
        })))
        .mount(&server)
        .await;

    let messages = conversation();
    let tools = search_descriptor();
    let response = oracle(&server)
        .respond(&OracleRequest::new(&messages, &tools))
        .await
        .unwrap();

    assert_eq!(response.tool_calls[0].arguments, json!("{\"query\": "));
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert_eq!(err, OracleError::Authentication("Incorrect API key provided".into()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::RateLimited { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::Api { status: 500, .. }), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, OracleError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert_eq!(err, OracleError::MalformedResponse("no choices in response".into()));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let messages = conversation();
    let err = oracle(&server)
        .with_timeout(Duration::from_millis(50))
        .respond(&OracleRequest::new(&messages, &[]))
        .await
        .unwrap_err();

    assert_eq!(err, OracleError::Timeout { ms: 50 });
}

#[test]
fn create_oracle_requires_api_key() {
    let config = AgentConfig::builder().build();
    let err = create_oracle(&config).err().unwrap();
    assert!(matches!(err, ConfigError::MissingApiKey("OPENAI_API_KEY")));

    let config = AgentConfig::builder().api_key("sk-test").build();
    let oracle = create_oracle(&config).unwrap();
    assert_eq!(oracle.name(), "openai");
}
