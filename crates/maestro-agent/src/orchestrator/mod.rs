//! Routing tasks to agents and running agent chains.
//!
//! The [`Orchestrator`] owns no agents itself. It resolves a target through
//! the shared [`AgentRegistry`], runs it under the configured deadlines and
//! records every outcome back into the registry's evaluations.

mod chain;
mod decision;
mod patterns;
mod planning;

pub use chain::ChainExecution;
pub use decision::{
    FALLBACK_CONFIDENCE, RoutingDecision, classify_input, decision_request,
    determine_agent_chain, parse_decision, planning_request,
};
pub use patterns::{PatternStore, PatternSummary, WorkflowPattern};

use maestro_core::{ModelProvider, OrchestratorConfig, RoutingMode};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::context::ExecutionContext;
use crate::registry::AgentRegistry;
use crate::result::{AgentResult, ErrorKind, ResultError};
use crate::types::{AgentType, Task};
use crate::{AgentError, Result};

/// Routes single tasks and runs chains of agents.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    config: OrchestratorConfig,
    /// Backend consulted for dynamic routing and workflow planning
    decider: Option<Arc<dyn ModelProvider>>,
    patterns: PatternStore,
}

impl Orchestrator {
    /// Creates an orchestrator over `registry`.
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            config,
            decider: None,
            patterns: PatternStore::new(),
        }
    }

    /// Sets the backend used for routing decisions and planning.
    #[must_use]
    pub fn with_decider(mut self, decider: Arc<dyn ModelProvider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// The shared agent registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Backend used for routing decisions and planning, if any.
    #[must_use]
    pub fn decider(&self) -> Option<Arc<dyn ModelProvider>> {
        self.decider.clone()
    }

    /// Recorded chain runs.
    #[must_use]
    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Routes `task` to one agent and runs it.
    ///
    /// Agent failures come back as a failed [`AgentResult`]. The result's
    /// `data["orchestration"]` records how the agent was chosen.
    ///
    /// # Errors
    /// Returns [`AgentError::FallbackUnavailable`] when neither the chosen
    /// agent nor the default agent is registered.
    pub async fn execute(&self, ctx: &ExecutionContext, task: &Task) -> Result<AgentResult> {
        let start = Instant::now();
        let decision = match self.config.routing_mode {
            RoutingMode::Static => self.static_decision(task),
            RoutingMode::Dynamic => self.dynamic_decision(ctx, task).await,
        };

        let (agent_type, agent, fell_back) = self.resolve(&decision)?;
        info!(
            task_id = %task.id,
            agent = %agent_type,
            confidence = decision.confidence,
            fallback = fell_back,
            "Routing task"
        );

        let mut result = if ctx.is_cancelled() {
            AgentResult::failure(ResultError::new(ErrorKind::Cancelled, "Operation cancelled"))
        } else {
            self.run_step(ctx, agent_type, agent.as_ref(), task).await
        };

        result.data.insert(
            "orchestration".to_owned(),
            json!({
                "routed_to": agent_type,
                "requested": decision.agent,
                "reasoning": decision.reasoning,
                "confidence": decision.confidence,
                "fallback": fell_back,
                "subtasks": decision.subtasks,
                "mode": self.config.routing_mode,
            }),
        );
        result.execution_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    fn static_decision(&self, task: &Task) -> RoutingDecision {
        if let Some(agent) = task.assigned_agent() {
            return RoutingDecision::new(agent.as_str(), "Assigned by workflow plan", 1.0);
        }
        if let Some(agent) = self.config.static_routes.get(task.kind.as_str()) {
            return RoutingDecision::new(
                agent.clone(),
                format!("Static route for {} tasks", task.kind),
                1.0,
            );
        }
        match classify_input(&task.input) {
            Some(agent) => RoutingDecision::new(agent.as_str(), "Matched input keywords", 0.7),
            None => RoutingDecision::new(
                self.config.default_agent.clone(),
                "No route matched, using default agent",
                FALLBACK_CONFIDENCE,
            ),
        }
    }

    async fn dynamic_decision(&self, ctx: &ExecutionContext, task: &Task) -> RoutingDecision {
        let Some(decider) = &self.decider else {
            debug!("No decision backend configured, using static routing");
            return self.static_decision(task);
        };

        let request = decision_request(task, &self.registry.descriptors());
        let decision_ctx = ctx.with_timeout(self.config.decision_timeout());
        match decision_ctx.guard(decider.complete(&request)).await {
            Ok(response) => parse_decision(&response.text).unwrap_or_else(|| {
                warn!(response = %response.text, "Unparseable routing decision");
                RoutingDecision::fallback(
                    &self.config.default_agent,
                    format!(
                        "Failed to parse routing decision, defaulting to {}",
                        self.config.default_agent
                    ),
                )
            }),
            Err(err) => {
                warn!(error = %err, "Routing decision failed");
                RoutingDecision::fallback(
                    &self.config.default_agent,
                    format!(
                        "Routing decision failed ({err}), defaulting to {}",
                        self.config.default_agent
                    ),
                )
            }
        }
    }

    /// Resolves a decision to a registered agent, falling back to the
    /// default agent. The flag reports whether the fallback was used.
    fn resolve(&self, decision: &RoutingDecision) -> Result<(AgentType, Arc<dyn Agent>, bool)> {
        if let Ok(agent_type) = decision.agent.parse::<AgentType>() {
            if let Ok(agent) = self.registry.get(agent_type) {
                return Ok((agent_type, agent, decision.fallback));
            }
        }

        warn!(
            requested = %decision.agent,
            fallback = %self.config.default_agent,
            "Requested agent unavailable, using default agent"
        );
        let unavailable = || AgentError::FallbackUnavailable {
            requested: decision.agent.clone(),
            fallback: self.config.default_agent.clone(),
        };
        let fallback_type: AgentType = self
            .config
            .default_agent
            .parse()
            .map_err(|_| unavailable())?;
        let agent = self.registry.get(fallback_type).map_err(|_| unavailable())?;
        Ok((fallback_type, agent, true))
    }

    /// Runs one agent under the step deadline and records its evaluation.
    ///
    /// An `Err` from the agent becomes a failed result. Cancelled runs are
    /// not counted in the evaluation.
    pub(crate) async fn run_step(
        &self,
        ctx: &ExecutionContext,
        agent_type: AgentType,
        agent: &dyn Agent,
        task: &Task,
    ) -> AgentResult {
        let start = Instant::now();
        let mut step_ctx = ctx.with_timeout(self.config.step_timeout());
        if let Some(limit) = task.timeout {
            step_ctx = step_ctx.with_timeout(limit);
        }

        let mut result = match step_ctx.guard(agent.execute(&step_ctx, task)).await {
            Ok(result) => result,
            Err(err) => {
                warn!(agent = %agent_type, error = %err, "Agent execution failed");
                AgentResult::failure(ResultError::from_error(&err))
            }
        };
        if result.execution_ms == 0 {
            result.execution_ms = start.elapsed().as_millis() as u64;
        }

        if !result.is_cancelled() {
            self.registry.record_execution(agent_type, &result);
        }
        result
    }
}
