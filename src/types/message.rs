//! Conversation messages exchanged with the reasoning oracle.

use serde::{Deserialize, Serialize};

use super::usage::Usage;

/// One entry of a run's conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Standing instructions. Exactly one per run, always first.
    SystemDirective { text: String },
    /// The question being answered, or a follow-up injected by the loop.
    UserQuery { text: String },
    /// One consumed oracle response.
    OracleTurn(OracleTurn),
    /// Output of one tool invocation.
    ToolResult(ToolResult),
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::SystemDirective { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::UserQuery { text: text.into() }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            Self::ToolResult(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_oracle_turn(&self) -> Option<&OracleTurn> {
        match self {
            Self::OracleTurn(turn) => Some(turn),
            _ => None,
        }
    }
}

/// A tool call requested by the oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Usually a JSON object; a raw string when the oracle sent undecodable JSON.
    pub arguments: serde_json::Value,
}

/// Result of one tool invocation, success or rendered error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub invocation_id: String,
    pub tool_name: String,
    pub text: String,
    #[serde(default)]
    pub is_error: bool,
}

/// A classified oracle turn.
///
/// Exactly one variant is active and its payload is never empty: `ToolInvocations`
/// carries at least one call, `FinalText` carries non-blank text. Build turns
/// through [`OracleTurn::classify`] or the checked constructors so the loop never
/// sees a turn that asks for nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OracleTurn {
    ToolInvocations { calls: Vec<ToolInvocation> },
    FinalText { text: String },
}

/// Returned when a response has neither tool calls nor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTurn;

impl OracleTurn {
    pub fn tool_invocations(calls: Vec<ToolInvocation>) -> Option<Self> {
        (!calls.is_empty()).then_some(Self::ToolInvocations { calls })
    }

    pub fn final_text(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self::FinalText { text })
    }

    /// Classify a raw oracle response. Tool calls take precedence over any
    /// text that came with them.
    pub fn classify(response: OracleResponse) -> Result<Self, EmptyTurn> {
        if !response.tool_calls.is_empty() {
            if !response.text.trim().is_empty() {
                tracing::debug!(
                    chars = response.text.len(),
                    "dropping text that accompanied tool calls"
                );
            }
            return Ok(Self::ToolInvocations {
                calls: response.tool_calls,
            });
        }
        Self::final_text(response.text).ok_or(EmptyTurn)
    }
}

/// Unclassified response from a reasoning oracle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleResponse {
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
    pub usage: Usage,
}

impl OracleResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls,
            ..Default::default()
        }
    }
}
