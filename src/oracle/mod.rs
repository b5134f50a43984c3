//! Reasoning oracle: the model that decides the agent's next step.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AgentConfig;
use crate::error::{ConfigError, OracleError};
use crate::tools::ToolDescriptor;
use crate::types::Message;

pub use crate::types::OracleResponse;

/// One call to the oracle: the whole conversation so far plus the tools it
/// may request. An empty `tools` slice means "answer now, no tools".
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDescriptor],
}

impl<'a> OracleRequest<'a> {
    pub fn new(messages: &'a [Message], tools: &'a [ToolDescriptor]) -> Self {
        Self { messages, tools }
    }

    pub fn offers_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Implemented by every backend that can drive the agent loop.
///
/// Implementations must bound their own latency and report expiry as
/// [`OracleError::Timeout`] instead of hanging.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    async fn respond(&self, request: &OracleRequest<'_>) -> Result<OracleResponse, OracleError>;
}

/// Build the default oracle for `config`.
#[allow(unused_variables)]
pub fn create_oracle(config: &AgentConfig) -> Result<Arc<dyn ReasoningOracle>, ConfigError> {
    #[cfg(feature = "openai")]
    {
        Ok(Arc::new(openai::OpenAiOracle::from_config(config)?))
    }
    #[cfg(not(feature = "openai"))]
    {
        Err(ConfigError::Invalid(
            "no oracle backend enabled; build with the `openai` feature".into(),
        ))
    }
}
