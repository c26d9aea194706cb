use maestro_core::Error as CoreError;
use maestro_routing::RoutingError;
use std::result::Result as StdResult;
use thiserror::Error;

use crate::types::AgentType;

/// Result type for agent operations.
pub type Result<T> = StdResult<T, AgentError>;

/// Errors raised by the registry, agents and the orchestrator.
#[derive(Debug, Error)]
pub enum AgentError {
    /// An agent of this type is already registered.
    #[error("Agent already registered: {0}")]
    AlreadyRegistered(AgentType),

    /// No agent of this type is registered.
    #[error("Agent not registered: {0}")]
    NotRegistered(AgentType),

    /// A string did not name a known agent type.
    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    /// A tool with this name is already registered.
    #[error("Tool already registered: {0}")]
    ToolAlreadyRegistered(String),

    /// No tool with this name is registered.
    #[error("Tool not registered: {0}")]
    ToolNotRegistered(String),

    /// Tool input failed validation.
    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    /// A tool failed while running.
    #[error("Tool execution failed: {0}")]
    ToolFailed(String),

    /// Nothing has been recorded for this agent yet.
    #[error("No evaluation data for agent: {0}")]
    NoEvaluation(AgentType),

    /// Neither the routed agent nor the default agent can run the task.
    #[error("Fallback agent {fallback} unavailable (requested: {requested})")]
    FallbackUnavailable {
        /// What the routing decision asked for
        requested: String,
        /// The configured default agent
        fallback: String,
    },

    /// A workflow plan could not be produced.
    #[error("Workflow planning failed: {0}")]
    PlanningFailed(String),

    /// The model router rejected the request.
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// A backend call or core operation failed.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl AgentError {
    /// Whether the error reports a cancelled operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Core(CoreError::Cancelled))
    }

    /// Whether the error reports an exceeded deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Core(CoreError::Timeout(_)))
    }

    /// Whether the same call may succeed if attempted again later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Core(err) if err.is_retryable())
    }
}
