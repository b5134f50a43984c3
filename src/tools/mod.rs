//! Tool system: descriptors, arguments, the registry, and built-in tools.

pub mod arguments;
pub mod registry;
pub mod tool;
pub mod types;
pub mod web_search;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool};
pub use types::{ParameterBuilder, ToolDescriptor, ToolParameters};
pub use web_search::{SearchHit, WebSearchTool, WEB_SEARCH_TOOL_NAME};

use crate::config::AgentConfig;
use crate::error::ToolError;

impl ToolRegistry {
    /// Registry holding the built-in tools, tuned from `config`.
    pub fn with_defaults(config: &AgentConfig) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(
            WebSearchTool::new()
                .with_max_results(config.max_search_results)
                .with_timeout(config.search_timeout()),
        )?;
        Ok(registry)
    }
}
