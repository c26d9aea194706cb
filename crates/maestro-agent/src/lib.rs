//! Specialized agents and the orchestrator that routes work between them.
//!
//! This crate provides:
//!
//! - **Agents**: the [`Agent`] contract and [`BackendAgent`], a profile-driven
//!   agent that answers through the model router
//! - **Registry**: agent and tool registration plus per-agent evaluations
//! - **Orchestration**: single-task routing, agent chains, recorded workflow
//!   patterns and backend-planned workflows
//!
//! # Example
//!
//! ```no_run
//! use maestro_agent::{
//!     AgentRegistry, ExecutionContext, Orchestrator, ProviderSet, Sampling, Task,
//!     register_default_agents,
//! };
//! use maestro_core::{MaestroConfig, TaskKind};
//! use maestro_routing::Router;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MaestroConfig::default();
//! let router = Arc::new(Router::with_defaults());
//! let registry = Arc::new(AgentRegistry::new());
//! register_default_agents(
//!     &registry,
//!     &config.agents,
//!     Sampling::from(&config.providers),
//!     &router,
//!     &ProviderSet::new(),
//! )?;
//!
//! let orchestrator = Orchestrator::new(registry, config.orchestrator.clone());
//! let task = Task::new(TaskKind::Code, "Implement a rate limiter");
//! let chain = orchestrator.suggest_chain(&task);
//! let execution = orchestrator
//!     .execute_chain(&ExecutionContext::new(), &task, &chain)
//!     .await;
//! println!("{}", execution.final_output);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::assertions_on_result_states,
        clippy::float_cmp,
        clippy::absolute_paths,
        reason = "Allow for tests"
    )
)]

/// The agent contract.
pub mod agent;
/// Router-backed agents and provider sets.
pub mod backend_agent;
/// Cancellation and deadlines.
pub mod context;
/// Error types and result definitions.
pub mod error;
/// Per-agent performance records.
pub mod evaluation;
/// Task routing, chains and workflow planning.
pub mod orchestrator;
/// Built-in agent profiles.
pub mod profiles;
/// Agent and tool registration.
pub mod registry;
/// Agent execution results.
pub mod result;
/// The tool contract.
pub mod tool;
/// Agent identities, tasks and contexts.
pub mod types;

pub use agent::Agent;
pub use backend_agent::{BackendAgent, ProviderSet, Sampling, register_default_agents};
pub use context::ExecutionContext;
pub use error::{AgentError, Result};
pub use evaluation::AgentEvaluation;
pub use orchestrator::{
    ChainExecution, FALLBACK_CONFIDENCE, Orchestrator, PatternStore, PatternSummary,
    RoutingDecision, WorkflowPattern, classify_input, determine_agent_chain, parse_decision,
};
pub use profiles::{AgentProfile, default_profiles};
pub use registry::AgentRegistry;
pub use result::{AgentResult, ErrorKind, MAX_CONFIDENCE, ResultError};
pub use tool::Tool;
pub use types::{
    AgentDescriptor, AgentType, Capability, HistoryMessage, Task, TaskContext, truncate_output,
};
