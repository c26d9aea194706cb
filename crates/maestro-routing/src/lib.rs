//! Model routing for the maestro orchestration system.
//!
//! The [`Router`] filters a [`Catalog`] of backends by hard constraints,
//! scores the survivors with four weighted nodes and boosts backends whose
//! [`PerformanceTracker`] record shows a high success rate.
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

/// Backend descriptors and the default catalog.
pub mod catalog;
/// Routing error types.
pub mod error;
/// Candidate scoring and selection.
pub mod router;
/// Rolling per-backend statistics.
pub mod tracker;

pub use catalog::{Catalog, Model};
pub use error::{Result, RoutingError};
pub use router::{Candidate, Node, Router, SelectOptions, TASK_FIT_WEIGHT, WeightProfile};
pub use tracker::{IMPROVEMENT_INTERVAL, PerformanceTracker, Stats};
