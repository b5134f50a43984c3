//! Error types for delve.
//!
//! Three layers, matching who can recover from what:
//!
//! - [`ToolError`] is recovered inside the loop: the agent renders it as the
//!   text of a tool result and keeps going.
//! - [`OracleError`] aborts the run and is handed to the caller untouched.
//! - [`AgentError`] is what `run` returns.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use std::time::Duration;

use thiserror::Error;

/// Failures at the tool boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool '{name}' not found")]
    UnknownTool { name: String },

    #[error("{tool} failed: {cause}")]
    ExecutionFailed { tool: String, cause: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("A tool named '{name}' is already registered")]
    DuplicateToolName { name: String },
}

impl ToolError {
    pub fn execution_failed(tool: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            cause: cause.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Tool
    }

    /// Text handed back to the oracle in place of a tool's output.
    pub fn to_tool_result_text(&self) -> String {
        format!("Error: {self}")
    }
}

/// Failures talking to the reasoning oracle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Oracle timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),
}

impl OracleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TransportFailure(_) => ErrorCategory::Network,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::MalformedResponse(_) => ErrorCategory::Protocol,
        }
    }

    /// Whether a caller-side retry could plausibly succeed. The loop itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

impl OracleError {
    /// Classify a reqwest failure. `deadline` is the limit the request ran
    /// under and is what a timeout reports.
    pub fn from_transport(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                ms: deadline.as_millis() as u64,
            }
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::TransportFailure(err.to_string())
        }
    }
}

/// Configuration problems, surfaced before any oracle call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Terminal failure of a run.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Iteration budget exhausted and the final answer was empty")]
    BudgetExhaustedNoAnswer,

    #[error("Oracle returned neither tool invocations nor text")]
    OracleContractViolation,

    #[error("Run canceled")]
    Canceled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AgentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Oracle(err) => err.category(),
            Self::BudgetExhaustedNoAnswer => ErrorCategory::Budget,
            Self::OracleContractViolation => ErrorCategory::Protocol,
            Self::Canceled => ErrorCategory::Canceled,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        self.category().recovery_suggestion()
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
