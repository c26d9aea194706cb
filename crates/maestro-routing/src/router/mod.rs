//! Scoring-based model selection.
//!
//! Selection runs in three stages:
//! 1. hard constraints drop every model that cannot take the request at all
//! 2. four weighted nodes score the survivors (see [`WeightProfile`])
//! 3. models with a proven success rate get a multiplicative bonus
//!
//! The result is deterministic for a fixed catalog and tracker state.

mod scoring;

pub use scoring::{Node, TASK_FIT_WEIGHT, WeightProfile};

use maestro_core::{Priority, RouterConfig, TaskKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::catalog::{Catalog, Model};
use crate::tracker::PerformanceTracker;
use crate::{Result, RoutingError};

/// What a request needs from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOptions {
    /// Kind of work to perform
    pub task: TaskKind,
    /// Estimated input size in tokens
    pub input_tokens: usize,
    /// Structured function calls are required
    pub needs_function_calls: bool,
    /// Embedding support is required
    pub needs_embedding: bool,
    /// Trade-off preference
    pub priority: Priority,
}

impl SelectOptions {
    /// Options for `task` with no size or capability requirements.
    #[must_use]
    pub fn new(task: TaskKind) -> Self {
        Self {
            task,
            input_tokens: 0,
            needs_function_calls: false,
            needs_embedding: false,
            priority: Priority::Balanced,
        }
    }

    /// Sets the input size estimate.
    #[must_use]
    pub fn with_input_tokens(mut self, input_tokens: usize) -> Self {
        self.input_tokens = input_tokens;
        self
    }

    /// Requires structured function call support.
    #[must_use]
    pub fn with_function_calls(mut self, required: bool) -> Self {
        self.needs_function_calls = required;
        self
    }

    /// Requires embedding support.
    #[must_use]
    pub fn with_embedding(mut self, required: bool) -> Self {
        self.needs_embedding = required;
        self
    }

    /// Sets the priority mode.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    fn admits(&self, model: &Model) -> bool {
        model.max_input_tokens >= self.input_tokens
            && (!self.needs_function_calls || model.supports_function_calls)
            && (!self.needs_embedding || model.supports_embedding)
    }
}

/// A scored model, produced fresh by every selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The model being proposed
    pub model: Model,
    /// Per-dimension breakdown
    pub nodes: Vec<Node>,
    /// Weighted sum, including any bonus
    pub score: f64,
    /// Whether the improvement bonus was applied
    pub boosted: bool,
    /// Compact justification
    pub why: String,
}

/// Chooses backends for requests.
pub struct Router {
    /// Models to choose from
    catalog: Catalog,
    /// Outcome history feeding the bonus
    tracker: Arc<PerformanceTracker>,
    /// Thresholds and limits
    config: RouterConfig,
}

impl Router {
    /// Creates a router over `catalog`, sharing `tracker` with other components.
    #[must_use]
    pub fn new(catalog: Catalog, tracker: Arc<PerformanceTracker>, config: RouterConfig) -> Self {
        Self {
            catalog,
            tracker,
            config,
        }
    }

    /// Creates a router over the default catalog with a fresh tracker.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Catalog::with_defaults(),
            Arc::new(PerformanceTracker::new()),
            RouterConfig::default(),
        )
    }

    /// The catalog this router selects from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The shared performance tracker.
    #[must_use]
    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    /// Ranks compatible models, best first, returning at most `top_n`.
    ///
    /// # Errors
    /// Returns [`RoutingError::NoCompatibleModel`] if every model violates a
    /// hard constraint.
    pub fn select(&self, options: &SelectOptions) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = self
            .catalog
            .models()
            .iter()
            .filter(|model| options.admits(model))
            .map(|model| self.score(model, options))
            .collect();

        if candidates.is_empty() {
            return Err(RoutingError::NoCompatibleModel {
                task: options.task,
                input_tokens: options.input_tokens,
                needs_function_calls: options.needs_function_calls,
                needs_embedding: options.needs_embedding,
            });
        }

        candidates.sort_by(|left, right| right.score.total_cmp(&left.score));
        candidates.truncate(self.config.top_n.max(1));

        debug!(
            task = %options.task,
            priority = %options.priority,
            best = %candidates[0].model.name,
            score = candidates[0].score,
            "Selected model candidates"
        );
        Ok(candidates)
    }

    /// Returns the highest-ranked model.
    ///
    /// # Errors
    /// Returns [`RoutingError::NoCompatibleModel`] if no model qualifies.
    pub fn best_model(&self, options: &SelectOptions) -> Result<Model> {
        self.select(options)?
            .into_iter()
            .next()
            .map(|candidate| candidate.model)
            .ok_or(RoutingError::NoCompatibleModel {
                task: options.task,
                input_tokens: options.input_tokens,
                needs_function_calls: options.needs_function_calls,
                needs_embedding: options.needs_embedding,
            })
    }

    /// Feeds one completed call back into the tracker.
    ///
    /// # Errors
    /// Returns [`RoutingError::UnknownModel`] if the model is not in the catalog.
    pub fn record_outcome(
        &self,
        model: &str,
        success: bool,
        latency: Duration,
        confidence: f64,
    ) -> Result<()> {
        if self.catalog.find(model).is_none() {
            return Err(RoutingError::UnknownModel(model.to_owned()));
        }
        self.tracker.update(model, success, latency, confidence);
        Ok(())
    }

    fn score(&self, model: &Model, options: &SelectOptions) -> Candidate {
        let nodes = scoring::score_nodes(
            model,
            options.task,
            options.priority,
            self.config.default_fit,
        );
        let mut score: f64 = nodes.iter().map(Node::contribution).sum();

        let boosted = self
            .tracker
            .success_rate(&model.name)
            .is_some_and(|rate| rate > self.config.improvement_threshold);
        if boosted {
            score *= self.config.improvement_bonus;
        }

        debug!(model = %model.name, score, boosted, "Scored model");
        Candidate {
            why: scoring::why(model, options.task, self.config.default_fit),
            model: model.clone(),
            nodes,
            score,
            boosted,
        }
    }
}
