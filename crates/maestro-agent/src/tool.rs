use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::context::ExecutionContext;

/// A named operation agents may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// What the tool does.
    fn description(&self) -> &str;

    /// Checks the input before execution.
    ///
    /// # Errors
    /// Returns [`crate::AgentError::InvalidToolInput`] for malformed input.
    fn validate(&self, input: &Value) -> Result<()>;

    /// Runs the tool.
    ///
    /// # Errors
    /// Returns an error if validation or execution fails.
    async fn execute(&self, ctx: &ExecutionContext, input: Value) -> Result<Value>;
}
