//! Tool dispatch with errors flattened into result strings.

use admuse_core::error::ToolError;
use admuse_core::tool::ToolRegistry;
use tracing::{debug, warn};

/// Execute one tool call and return the result string for the model.
///
/// Never fails: an unknown name or a handler error becomes an
/// `"Error: ..."` string of the same shape as a success, so the model can
/// read it and recover.
pub async fn invoke(
    registry: &ToolRegistry,
    name: &str,
    arguments: serde_json::Value,
) -> String {
    let Some(tool) = registry.get(name) else {
        warn!(tool = name, "tool call for unregistered tool");
        return format!("Error: {}", ToolError::NotFound(name.to_string()));
    };

    debug!(tool = name, "executing tool");
    match tool.execute(arguments).await {
        Ok(result) => result,
        Err(e) => {
            warn!(tool = name, error = %e, "tool execution failed");
            format!("Error: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admuse_core::tool::Tool;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("it broke".into()))
        }
    }

    #[tokio::test]
    async fn unknown_tool_becomes_result_string() {
        let registry = ToolRegistry::new();
        let result = invoke(&registry, "nonexistent", serde_json::json!({})).await;
        assert!(result.contains("unknown tool"), "got: {result}");
        assert_eq!(result, "Error: unknown tool 'nonexistent'");
    }

    #[tokio::test]
    async fn handler_error_becomes_result_string() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool));
        let result = invoke(&registry, "broken", serde_json::json!({})).await;
        assert_eq!(result, "Error: it broke");
    }
}
