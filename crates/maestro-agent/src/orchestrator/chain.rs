//! Sequential agent chains.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Orchestrator;
use super::decision::determine_agent_chain;
use super::patterns::WorkflowPattern;
use crate::context::ExecutionContext;
use crate::result::AgentResult;
use crate::types::{AgentType, Task};

/// Success rate a recorded pattern needs before it is reused.
const PATTERN_REUSE_THRESHOLD: f64 = 0.5;

/// Outcome of running a chain of agents.
#[derive(Debug, Clone, Serialize)]
pub struct ChainExecution {
    /// Chain identifier, also stamped on every step's data
    pub id: Uuid,
    /// The task as submitted
    pub task: Task,
    /// Agents in planned order
    pub agents: Vec<AgentType>,
    /// One result per step that ran, in order
    pub results: Vec<AgentResult>,
    /// Planned agents that were not registered
    pub skipped: Vec<AgentType>,
    /// Whether the last step that ran succeeded
    pub success: bool,
    /// Whether the chain stopped because of cancellation
    pub cancelled: bool,
    /// Output of the last step that ran
    pub final_output: String,
    /// Wall time in milliseconds
    pub total_ms: u64,
    /// When the chain started
    pub started_at: DateTime<Utc>,
}

impl ChainExecution {
    /// Mean confidence over the steps that ran, 0 when none did.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(AgentResult::confidence).sum::<f64>() / self.results.len() as f64
    }

    /// The last step's result.
    #[must_use]
    pub fn final_result(&self) -> Option<&AgentResult> {
        self.results.last()
    }
}

impl Orchestrator {
    /// Runs `agents` in order, feeding each step the previous step's output.
    ///
    /// Unregistered agents are skipped. A failing step does not stop the
    /// chain; cancellation does. Chain success is the success of the last
    /// step that ran. Every run that executed at least one step and was not
    /// cancelled is recorded as a [`WorkflowPattern`].
    pub async fn execute_chain(
        &self,
        ctx: &ExecutionContext,
        task: &Task,
        agents: &[AgentType],
    ) -> ChainExecution {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(chain_id = %id, task_id = %task.id, steps = agents.len(), "Starting agent chain");

        let mut results: Vec<AgentResult> = Vec::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;
        // Input stays the original request; history accumulates step outputs.
        let mut carried = task.clone();

        for (index, &agent_type) in agents.iter().enumerate() {
            if ctx.is_cancelled() {
                cancelled = true;
                break;
            }

            let agent = match self.registry.get(agent_type) {
                Ok(agent) => agent,
                Err(err) => {
                    warn!(chain_id = %id, agent = %agent_type, error = %err, "Skipping unregistered agent");
                    skipped.push(agent_type);
                    continue;
                }
            };

            let step_task = match results.last().map(|previous| previous.output.as_str()) {
                Some(previous) if !previous.is_empty() => {
                    let next = carried.enriched(previous, self.config.context_truncation);
                    carried.context.history.clone_from(&next.context.history);
                    next
                }
                _ => carried.clone(),
            };

            let step = index + 1;
            debug!(chain_id = %id, agent = %agent_type, step, "Running chain step");
            let mut result = self.run_step(ctx, agent_type, agent.as_ref(), &step_task).await;
            result.data.insert("agent".to_owned(), json!(agent_type));
            result.data.insert("chain_step".to_owned(), json!(step));
            result.data.insert("chain_id".to_owned(), json!(id.to_string()));

            info!(
                chain_id = %id,
                agent = %agent_type,
                step,
                success = result.success,
                confidence = result.confidence(),
                execution_ms = result.execution_ms,
                "Chain step completed"
            );
            if !result.success && !result.is_cancelled() {
                warn!(chain_id = %id, agent = %agent_type, "Chain step failed, continuing");
            }
            if let (Some(suggested), Some(planned)) = (result.next_agent, agents.get(index + 1)) {
                if suggested != *planned {
                    info!(
                        chain_id = %id,
                        suggested = %suggested,
                        planned = %planned,
                        "Agent suggested a different next agent, keeping plan"
                    );
                }
            }

            let stop = result.is_cancelled();
            results.push(result);
            if stop {
                cancelled = true;
                break;
            }
            if index + 1 < agents.len() && !ctx.pause(self.config.step_delay()).await {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            warn!(chain_id = %id, completed = results.len(), "Agent chain cancelled");
        }

        let execution = ChainExecution {
            id,
            task: task.clone(),
            agents: agents.to_vec(),
            success: results.last().is_some_and(|last| last.success),
            final_output: results.last().map(|last| last.output.clone()).unwrap_or_default(),
            results,
            skipped,
            cancelled,
            total_ms: start.elapsed().as_millis() as u64,
            started_at,
        };

        if !execution.results.is_empty() && !execution.cancelled {
            self.patterns.record(WorkflowPattern {
                id,
                task_kind: task.kind,
                agent_sequence: execution.agents.clone(),
                success_rate: if execution.success { 1.0 } else { 0.0 },
                avg_duration_ms: execution.total_ms as f64,
                confidence: execution.confidence(),
                last_updated: Utc::now(),
            });
        }

        info!(
            chain_id = %id,
            success = execution.success,
            steps = execution.results.len(),
            total_ms = execution.total_ms,
            "Agent chain completed"
        );
        execution
    }

    /// Chain for `task`: the best recorded sequence for its kind when that
    /// sequence succeeds often enough, otherwise keyword rules.
    #[must_use]
    pub fn suggest_chain(&self, task: &Task) -> Vec<AgentType> {
        match self.patterns.best_for(task.kind) {
            Some(best) if best.success_rate >= PATTERN_REUSE_THRESHOLD => {
                debug!(
                    task_kind = %task.kind,
                    runs = best.runs,
                    success_rate = best.success_rate,
                    "Reusing recorded chain"
                );
                best.agent_sequence
            }
            _ => determine_agent_chain(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::{Script, ScriptedAgent};
    use crate::registry::AgentRegistry;
    use crate::result::ErrorKind;
    use crate::agent::Agent;
    use crate::types::Capability;
    use async_trait::async_trait;
    use maestro_core::{OrchestratorConfig, Role, TaskKind};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Appends its type to a log shared with the other agents of a chain.
    struct OrderedAgent {
        agent_type: AgentType,
        log: Arc<Mutex<Vec<AgentType>>>,
    }

    #[async_trait]
    impl Agent for OrderedAgent {
        fn agent_type(&self) -> AgentType {
            self.agent_type
        }

        fn description(&self) -> &str {
            "ordered"
        }

        fn capabilities(&self) -> Vec<Capability> {
            Vec::new()
        }

        async fn execute(
            &self,
            _ctx: &ExecutionContext,
            _task: &Task,
        ) -> crate::Result<AgentResult> {
            self.log.lock().unwrap().push(self.agent_type);
            Ok(AgentResult::success(self.agent_type.as_str(), 7.0))
        }
    }

    fn orchestrator(agents: Vec<Arc<ScriptedAgent>>) -> Orchestrator {
        let registry = Arc::new(AgentRegistry::new());
        for agent in agents {
            registry.register(agent).unwrap();
        }
        Orchestrator::new(
            registry,
            OrchestratorConfig {
                step_delay_ms: 0,
                context_truncation: 10,
                ..OrchestratorConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_chain_runs_in_order_and_enriches() {
        let analysis = Arc::new(ScriptedAgent::new(
            AgentType::Analysis,
            Script::Succeed("requirements are clear and small", 8.0),
        ));
        let development = Arc::new(ScriptedAgent::new(
            AgentType::Development,
            Script::Succeed("fn add() {}", 6.0),
        ));
        let orchestrator = orchestrator(vec![analysis.clone(), development.clone()]);
        let task = Task::new(TaskKind::Code, "add two numbers");

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &task,
                &[AgentType::Analysis, AgentType::Development],
            )
            .await;

        assert!(chain.success);
        assert!(!chain.cancelled);
        assert_eq!(chain.results.len(), 2);
        assert_eq!(chain.final_output, "fn add() {}");
        assert!((chain.confidence() - 7.0).abs() < 1e-9);

        assert_eq!(analysis.seen()[0].input, "add two numbers");
        let second = &development.seen()[0];
        assert_eq!(
            second.input,
            "Previous analysis:\nrequiremen...\n\nNow, add two numbers"
        );
        assert_eq!(second.id, task.id);
        let last = second.context.history.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "requirements are clear and small");

        for (index, result) in chain.results.iter().enumerate() {
            assert_eq!(result.data["chain_step"], index + 1);
            assert_eq!(result.data["chain_id"], chain.id.to_string());
        }
        assert_eq!(chain.results[1].data["agent"], "development");
        assert_eq!(orchestrator.patterns().get(chain.id).unwrap().success_rate, 1.0);
    }

    #[tokio::test]
    async fn test_chain_continues_after_failure_and_skips_missing() {
        let analysis = Arc::new(ScriptedAgent::new(AgentType::Analysis, Script::Fail));
        let quality = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Succeed("ok", 5.0)));
        let orchestrator = orchestrator(vec![analysis, quality.clone()]);
        let task = Task::new(TaskKind::Code, "check it");

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &task,
                &[AgentType::Analysis, AgentType::Architect, AgentType::Quality],
            )
            .await;

        assert_eq!(chain.skipped, vec![AgentType::Architect]);
        assert_eq!(chain.results.len(), 2);
        assert!(!chain.results[0].success);
        assert!(chain.success);
        assert_eq!(chain.results[1].data["chain_step"], 3);
        // A failed step has no output, so the next step gets the original input.
        assert_eq!(quality.seen()[0].input, "check it");
    }

    #[tokio::test]
    async fn test_chain_failure_is_last_step() {
        let analysis = Arc::new(ScriptedAgent::new(AgentType::Analysis, Script::Succeed("a", 9.0)));
        let quality = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Error));
        let orchestrator = orchestrator(vec![analysis, quality]);

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &Task::new(TaskKind::Code, "x"),
                &[AgentType::Analysis, AgentType::Quality],
            )
            .await;

        assert!(!chain.success);
        assert_eq!(chain.final_output, "");
        assert_eq!(chain.results[1].error.as_ref().unwrap().kind, ErrorKind::Agent);
        assert_eq!(orchestrator.patterns().get(chain.id).unwrap().success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let orchestrator = orchestrator(Vec::new());
        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &Task::new(TaskKind::Chat, "x"),
                &[AgentType::Analysis],
            )
            .await;

        assert!(!chain.success);
        assert!(chain.results.is_empty());
        assert!(chain.confidence().abs() < f64::EPSILON);
        assert!(orchestrator.patterns().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_chain() {
        let slow = Arc::new(ScriptedAgent::new(
            AgentType::Analysis,
            Script::Sleep(Duration::from_secs(5)),
        ));
        let after = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Succeed("ok", 5.0)));
        let orchestrator = orchestrator(vec![slow, after.clone()]);
        let ctx = ExecutionContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let chain = orchestrator
            .execute_chain(
                &ctx,
                &Task::new(TaskKind::Code, "x"),
                &[AgentType::Analysis, AgentType::Quality],
            )
            .await;

        assert!(chain.cancelled);
        assert_eq!(chain.results.len(), 1);
        assert!(chain.results[0].is_cancelled());
        assert!(after.seen().is_empty());
        assert!(orchestrator.registry().evaluation(AgentType::Analysis).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_chains_are_not_recorded() {
        let quality = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Succeed("ok", 5.0)));
        let slow = Arc::new(ScriptedAgent::new(
            AgentType::Monitoring,
            Script::Sleep(Duration::from_secs(5)),
        ));
        let orchestrator = orchestrator(vec![quality, slow]);
        let task = Task::new(TaskKind::Code, "hello there");

        let chain = orchestrator
            .execute_chain(&ExecutionContext::new(), &task, &[AgentType::Quality])
            .await;
        assert!(chain.success);

        for _ in 0..2 {
            let ctx = ExecutionContext::new();
            let canceller = ctx.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(10)).await;
                canceller.cancel();
            });
            let chain = orchestrator
                .execute_chain(&ctx, &task, &[AgentType::Quality, AgentType::Monitoring])
                .await;
            assert!(chain.cancelled);
            assert!(orchestrator.patterns().get(chain.id).is_none());
        }

        assert_eq!(orchestrator.patterns().len(), 1);
        let best = orchestrator.patterns().best_for(TaskKind::Code).unwrap();
        assert!((best.success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(orchestrator.suggest_chain(&task), vec![AgentType::Quality]);
    }

    #[tokio::test]
    async fn test_three_agents_run_in_planned_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plan = [AgentType::Strategy, AgentType::Architect, AgentType::Integration];
        let registry = Arc::new(AgentRegistry::new());
        for agent_type in plan {
            registry
                .register(Arc::new(OrderedAgent {
                    agent_type,
                    log: Arc::clone(&log),
                }))
                .unwrap();
        }
        let orchestrator = Orchestrator::new(
            registry,
            OrchestratorConfig {
                step_delay_ms: 0,
                ..OrchestratorConfig::default()
            },
        );

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &Task::new(TaskKind::Reason, "plan the rollout"),
                &[AgentType::Architect, AgentType::Strategy, AgentType::Integration],
            )
            .await;

        assert!(chain.success);
        assert_eq!(
            *log.lock().unwrap(),
            vec![AgentType::Architect, AgentType::Strategy, AgentType::Integration]
        );
        let steps: Vec<_> = chain.results.iter().map(|result| result.data["agent"].clone()).collect();
        assert_eq!(steps, vec![json!("architect"), json!("strategy"), json!("integration")]);
    }

    #[tokio::test]
    async fn test_middle_failure_still_runs_last_agent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(AgentRegistry::new());
        registry
            .register(Arc::new(OrderedAgent {
                agent_type: AgentType::Analysis,
                log: Arc::clone(&log),
            }))
            .unwrap();
        registry
            .register(Arc::new(ScriptedAgent::new(AgentType::Development, Script::Fail)))
            .unwrap();
        registry
            .register(Arc::new(OrderedAgent {
                agent_type: AgentType::Quality,
                log: Arc::clone(&log),
            }))
            .unwrap();
        let orchestrator = Orchestrator::new(
            registry,
            OrchestratorConfig {
                step_delay_ms: 0,
                ..OrchestratorConfig::default()
            },
        );

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &Task::new(TaskKind::Code, "x"),
                &[AgentType::Analysis, AgentType::Development, AgentType::Quality],
            )
            .await;

        assert_eq!(*log.lock().unwrap(), vec![AgentType::Analysis, AgentType::Quality]);
        assert!(!chain.results[1].success);
        assert!(chain.success);
    }

    #[tokio::test]
    async fn test_next_agent_hint_does_not_change_plan() {
        let mut analysis = ScriptedAgent::new(AgentType::Analysis, Script::Succeed("done", 7.0));
        analysis.next_agent = Some(AgentType::Deployment);
        let quality = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Succeed("ok", 5.0)));
        let orchestrator = orchestrator(vec![Arc::new(analysis), quality.clone()]);

        let chain = orchestrator
            .execute_chain(
                &ExecutionContext::new(),
                &Task::new(TaskKind::Code, "x"),
                &[AgentType::Analysis, AgentType::Quality],
            )
            .await;

        assert_eq!(chain.results.len(), 2);
        assert_eq!(quality.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_suggest_chain_prefers_successful_pattern() {
        let quality = Arc::new(ScriptedAgent::new(AgentType::Quality, Script::Succeed("ok", 5.0)));
        let orchestrator = orchestrator(vec![quality]);
        let task = Task::new(TaskKind::Code, "hello there");

        assert_eq!(
            orchestrator.suggest_chain(&task),
            vec![AgentType::Analysis, AgentType::Architect, AgentType::Development]
        );

        orchestrator
            .execute_chain(&ExecutionContext::new(), &task, &[AgentType::Quality])
            .await;
        assert_eq!(orchestrator.suggest_chain(&task), vec![AgentType::Quality]);
    }
}
