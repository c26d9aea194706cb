//! Core types and traits for the maestro agent orchestration system.
//!
//! This crate provides the backend request/response contract, the
//! [`ModelProvider`] trait, task kinds and priority modes, configuration,
//! and the shared error type used across the workspace.
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

/// Configuration loading and defaults.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Task kinds and routing priorities.
pub mod kinds;
/// Running-average bookkeeping shared by the trackers.
pub mod stats;
/// Synchronization helpers for poisoned locks.
pub mod sync;
/// Trait definitions for model providers.
pub mod traits;
/// Backend request and response types.
pub mod types;

pub use config::{
    AgentSettings, AgentsConfig, MAX_TIMEOUT_SECONDS, MaestroConfig, OrchestratorConfig,
    ProvidersConfig, RouterConfig, RoutingMode,
};
pub use error::{Error, Result};
pub use kinds::{Priority, TaskKind};
pub use stats::running_average;
pub use sync::{IgnoreLock, IgnoreRwLock};
pub use traits::{ModelProvider, StreamCallback};
pub use types::{Message, Request, Response, Role, TokenUsage};
