//! Convenience re-exports for common use.

pub use crate::agent::{ResearchAgent, RunEvent, RunEventPayload, RunReport};
pub use crate::config::AgentConfig;
pub use crate::error::{AgentError, OracleError, Result, ToolError};
pub use crate::oracle::{OracleRequest, OracleResponse, ReasoningOracle};
pub use crate::tools::{Tool, ToolArguments, ToolDescriptor, ToolParameters, ToolRegistry, WebSearchTool};
pub use crate::types::{Message, OracleTurn, ToolInvocation, ToolResult, Usage};
