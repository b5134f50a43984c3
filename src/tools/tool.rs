//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::arguments::ToolArguments;
use super::types::ToolDescriptor;
use crate::error::ToolError;

/// A capability the oracle can invoke by name.
///
/// Implementations return text. Failures come back as [`ToolError`]; the
/// registry and the agent turn them into text for the oracle, so a tool never
/// needs to panic or swallow errors itself.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

type ToolHandler = dyn Fn(ToolArguments) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    descriptor: ToolDescriptor,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    pub fn new<F, Fut>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            descriptor,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolParameters;

    #[tokio::test]
    async fn fn_tool_executes_handler() {
        let tool = FnTool::new(
            ToolDescriptor::new(
                "greet",
                "Greet a person",
                ToolParameters::object().string("name", "Name", true).build(),
            ),
            |args| async move { Ok(format!("Hello, {}!", args.get_str("name")?)) },
        );

        assert_eq!(tool.name(), "greet");
        let args = ToolArguments::from_value(&serde_json::json!({"name": "World"})).unwrap();
        assert_eq!(tool.execute(&args).await.unwrap(), "Hello, World!");

        let err = tool.execute(&ToolArguments::empty()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
