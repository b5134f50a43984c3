//! Shared test helpers: a scripted oracle and tool fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use delve::error::{OracleError, ToolError};
use delve::oracle::{OracleRequest, OracleResponse, ReasoningOracle};
use delve::tools::{ToolDescriptor, ToolParameters, ToolRegistry};
use delve::types::{Message, ToolInvocation, Usage};

/// What the oracle saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// An oracle that replays queued responses and records every request.
///
/// Once the queue is empty it keeps returning `fallback` (a final text by
/// default).
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<OracleResponse, OracleError>>>,
    fallback: Mutex<Option<OracleResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Some(OracleResponse::text("Fallback answer"))),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue a final-text response.
    pub fn queue_text(&self, text: &str) {
        self.queue(Ok(OracleResponse {
            text: text.to_string(),
            usage: usage(10, 20),
            ..Default::default()
        }));
    }

    /// Queue a response requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls(vec![invocation(id, name, args)]);
    }

    pub fn queue_tool_calls(&self, calls: Vec<ToolInvocation>) {
        self.queue(Ok(OracleResponse {
            tool_calls: calls,
            usage: usage(10, 5),
            ..Default::default()
        }));
    }

    /// Queue a response with neither text nor tool calls.
    pub fn queue_empty(&self) {
        self.queue(Ok(OracleResponse::default()));
    }

    pub fn queue_error(&self, error: OracleError) {
        self.queue(Err(error));
    }

    pub fn queue(&self, response: Result<OracleResponse, OracleError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Response returned once the queue is drained; `None` means an empty turn.
    pub fn set_fallback(&self, response: Option<OracleResponse>) {
        *self.fallback.lock().unwrap() = response;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn respond(&self, request: &OracleRequest<'_>) -> Result<OracleResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
        });

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        Ok(self.fallback.lock().unwrap().clone().unwrap_or_default())
    }
}

pub fn usage(input: u32, output: u32) -> Usage {
    Usage {
        input_tokens: input,
        output_tokens: output,
        total_tokens: input + output,
    }
}

pub fn invocation(id: &str, name: &str, args: serde_json::Value) -> ToolInvocation {
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args,
    }
}

/// A `web_search` stand-in that answers from memory and counts calls.
pub fn fake_search_registry(calls: Arc<AtomicUsize>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register_fn(
            ToolDescriptor::new(
                "web_search",
                "Search the web for information.",
                ToolParameters::object()
                    .string("query", "The search query to look up", true)
                    .build(),
            ),
            move |args| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let query = args.get_str("query")?.to_string();
                    Ok(format!("Search results for '{query}':\n\n1. Result\n   Snippet\n   URL: https://example.com"))
                }
            },
        )
        .unwrap();
    registry
}

/// A tool that always fails.
pub fn failing_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register_fn(
            ToolDescriptor::new("flaky", "Always fails", ToolParameters::empty()),
            |_| async { Err(ToolError::execution_failed("flaky", "upstream unavailable")) },
        )
        .unwrap();
    registry
}
