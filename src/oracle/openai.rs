//! OpenAI Chat Completions oracle.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::{ConfigError, OracleError};
use crate::types::{Message, OracleTurn, ToolInvocation, Usage};
use crate::util::timeout::with_timeout;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{OracleRequest, OracleResponse, ReasoningOracle};

pub struct OpenAiOracle {
    model: String,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiOracle {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(crate::config::DEFAULT_ORACLE_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(&config.model, api_key, &config.base_url).with_timeout(config.oracle_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, request: &OracleRequest<'_>) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if request.offers_tools() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters.schema,
                        }
                    })
                })
                .collect();
            body["tools"] = tool_defs.into();
            body["tool_choice"] = "auto".into();
        }

        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<OracleResponse, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::from_transport(e, self.timeout))?;

        let status = resp.status().as_u16();
        let body_text = resp
            .text()
            .await
            .map_err(|e| OracleError::from_transport(e, self.timeout))?;
        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = serde_json::from_str(&body_text)
            .map_err(|e| OracleError::MalformedResponse(format!("undecodable completion: {e}")))?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::MalformedResponse("no choices in response".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolInvocation {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        Ok(OracleResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ReasoningOracle for OpenAiOracle {
    fn name(&self) -> &str {
        "openai"
    }

    async fn respond(&self, request: &OracleRequest<'_>) -> Result<OracleResponse, OracleError> {
        let body = self.build_request_body(request);

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "OpenAI chat completion"
        );

        with_timeout(self.timeout, self.send(&body), |d| OracleError::Timeout {
            ms: d.as_millis() as u64,
        })
        .await
    }
}

fn message_to_openai(msg: &Message) -> serde_json::Value {
    match msg {
        Message::SystemDirective { text } => serde_json::json!({ "role": "system", "content": text }),
        Message::UserQuery { text } => serde_json::json!({ "role": "user", "content": text }),
        Message::OracleTurn(OracleTurn::FinalText { text }) => {
            serde_json::json!({ "role": "assistant", "content": text })
        }
        Message::OracleTurn(OracleTurn::ToolInvocations { calls }) => {
            let tool_calls: Vec<serde_json::Value> = calls
                .iter()
                .map(|tc| {
                    let arguments = match &tc.arguments {
                        serde_json::Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    };
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": { "name": tc.name, "arguments": arguments },
                    })
                })
                .collect();
            serde_json::json!({
                "role": "assistant",
                "content": serde_json::Value::Null,
                "tool_calls": tool_calls,
            })
        }
        Message::ToolResult(result) => serde_json::json!({
            "role": "tool",
            "tool_call_id": result.invocation_id,
            "name": result.tool_name,
            "content": result.text,
        }),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
