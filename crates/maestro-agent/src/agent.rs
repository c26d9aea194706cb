use async_trait::async_trait;

use crate::Result;
use crate::context::ExecutionContext;
use crate::result::AgentResult;
use crate::types::{AgentDescriptor, AgentType, Capability, Task};

/// A specialized unit that turns a [`Task`] into an [`AgentResult`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Identity used for registration and routing.
    fn agent_type(&self) -> AgentType;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Advertised capabilities.
    fn capabilities(&self) -> Vec<Capability>;

    /// Executes a task.
    ///
    /// Expected failures, including backend errors, are reported through a
    /// failed [`AgentResult`].
    ///
    /// # Errors
    /// Returns an error only for conditions the orchestrator cannot recover
    /// from locally.
    async fn execute(&self, ctx: &ExecutionContext, task: &Task) -> Result<AgentResult>;

    /// Snapshot of the agent's public description.
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            agent_type: self.agent_type(),
            description: self.description().to_owned(),
            capabilities: self.capabilities(),
        }
    }
}
