//! Tool registry: name-keyed dispatch over registered tools.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::warn;

use super::arguments::ToolArguments;
use super::tool::{FnTool, Tool};
use super::types::ToolDescriptor;
use crate::error::ToolError;

/// Registry of tools available to an agent.
///
/// Names are unique: registering a second tool under an existing name fails
/// with [`ToolError::DuplicateToolName`] and leaves the registry unchanged.
/// Descriptors are reported in registration order. Once handed to an agent
/// the registry is shared read-only across runs.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    descriptors: Vec<ToolDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let descriptor = tool.descriptor().clone();
        if self.by_name.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateToolName {
                name: descriptor.name,
            });
        }
        self.by_name.insert(descriptor.name.clone(), self.tools.len());
        self.descriptors.push(descriptor);
        self.tools.push(tool);
        Ok(())
    }

    /// Register a descriptor together with a closure that executes it.
    pub fn register_fn<F, Fut>(&mut self, descriptor: ToolDescriptor, handler: F) -> Result<(), ToolError>
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FnTool::new(descriptor, handler))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by name.
    ///
    /// Only two errors leave this function: [`ToolError::UnknownTool`] for an
    /// unregistered name, and [`ToolError::ExecutionFailed`] for everything
    /// else (bad arguments, tool failures, panics inside the tool).
    pub async fn execute(&self, name: &str, args: &serde_json::Value) -> Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;

        let args = ToolArguments::from_value(args).map_err(|e| normalize(name, e))?;

        match AssertUnwindSafe(tool.execute(&args)).catch_unwind().await {
            Ok(result) => result.map_err(|e| normalize(name, e)),
            Err(_) => {
                warn!(tool = name, "tool panicked during execution");
                Err(ToolError::execution_failed(name, "tool panicked"))
            }
        }
    }
}

fn normalize(tool: &str, err: ToolError) -> ToolError {
    match err {
        ToolError::ExecutionFailed { .. } => err,
        ToolError::InvalidArguments(cause) => ToolError::execution_failed(tool, cause),
        other => ToolError::execution_failed(tool, other.to_string()),
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
