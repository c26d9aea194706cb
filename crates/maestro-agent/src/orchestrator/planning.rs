//! Backend-produced workflow plans.

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::Orchestrator;
use super::decision::{PlanStep, extract_json, planning_request};
use crate::context::ExecutionContext;
use crate::types::{AgentType, Task};
use crate::{AgentError, Result};

impl Orchestrator {
    /// Asks the decision backend to break `task` into ordered agent steps.
    ///
    /// Each step becomes a [`Task`] that inherits the original context and
    /// priority and carries `agent`, `step_number`, `description` and
    /// `dependencies` parameters. [`Task::assigned_agent`] reads the agent
    /// back, so the steps can be handed straight to [`Orchestrator::execute`].
    ///
    /// # Errors
    /// Returns [`AgentError::PlanningFailed`] if no backend is configured or
    /// the plan is empty, malformed or names an unknown agent, and a core
    /// error if the backend call fails, times out or is cancelled.
    pub async fn plan_workflow(&self, ctx: &ExecutionContext, task: &Task) -> Result<Vec<Task>> {
        let decider = self
            .decider
            .as_ref()
            .ok_or_else(|| AgentError::PlanningFailed("no planning backend configured".to_owned()))?;

        let request = planning_request(task, &self.registry.descriptors());
        let response = ctx
            .with_timeout(self.config.decision_timeout())
            .guard(decider.complete(&request))
            .await?;

        let steps: Vec<PlanStep> = extract_json(&response.text, '[', ']').ok_or_else(|| {
            warn!(response = %response.text, "Unparseable workflow plan");
            AgentError::PlanningFailed("response is not a JSON array of steps".to_owned())
        })?;
        if steps.is_empty() {
            return Err(AgentError::PlanningFailed("plan has no steps".to_owned()));
        }

        let tasks = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| -> Result<Task> {
                let agent: AgentType = step.agent.parse().map_err(|_| {
                    AgentError::PlanningFailed(format!("unknown agent in plan: {}", step.agent))
                })?;
                let step_number = if step.step_number == 0 {
                    index as u32 + 1
                } else {
                    step.step_number
                };
                let input = if step.input.trim().is_empty() {
                    step.description.clone()
                } else {
                    step.input
                };

                let mut planned = task.clone();
                planned.id = Uuid::new_v4();
                planned.input = input;
                planned.parameters.insert("agent".to_owned(), json!(agent));
                planned.parameters.insert("step_number".to_owned(), json!(step_number));
                planned.parameters.insert("description".to_owned(), json!(step.description));
                planned.parameters.insert("dependencies".to_owned(), json!(step.dependencies));
                Ok(planned)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(task_id = %task.id, steps = tasks.len(), "Planned workflow");
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::{Script, ScriptedAgent};
    use crate::registry::AgentRegistry;
    use crate::types::TaskContext;
    use maestro_core::{OrchestratorConfig, TaskKind};
    use maestro_providers::MockProvider;
    use std::sync::Arc;

    fn planner(reply: &str) -> (Orchestrator, Arc<MockProvider>) {
        let registry = Arc::new(AgentRegistry::new());
        registry
            .register(Arc::new(ScriptedAgent::new(
                AgentType::Development,
                Script::Succeed("done", 7.0),
            )))
            .unwrap();
        let decider = Arc::new(MockProvider::new("planner").with_default_response(reply));
        let orchestrator =
            Orchestrator::new(registry, OrchestratorConfig::default()).with_decider(decider.clone());
        (orchestrator, decider)
    }

    #[tokio::test]
    async fn test_plan_becomes_tasks() {
        let reply = r#"Here is the plan:
[
  {"step_number": 1, "agent": "analysis", "description": "Gather requirements", "dependencies": [], "input": "List the requirements"},
  {"step_number": 2, "agent": "development", "description": "Write the code", "dependencies": [1]}
]"#;
        let (orchestrator, decider) = planner(reply);
        let task = Task::new(TaskKind::Code, "build a parser")
            .with_context(TaskContext::new().with_phase("implementation"));

        let plan = orchestrator
            .plan_workflow(&ExecutionContext::new(), &task)
            .await
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].assigned_agent(), Some(AgentType::Analysis));
        assert_eq!(plan[0].input, "List the requirements");
        assert_eq!(plan[1].input, "Write the code");
        assert_eq!(plan[1].parameters["dependencies"], json!([1]));
        assert_eq!(plan[1].parameters["step_number"], 2);
        assert_eq!(plan[1].context.phase, "implementation");
        assert_ne!(plan[0].id, task.id);
        assert!(decider.get_call_history()[0].contains("Task Type: code"));
    }

    #[tokio::test]
    async fn test_planned_step_routes_to_assigned_agent() {
        let reply = r#"[{"agent": "development", "description": "Write it"}]"#;
        let (orchestrator, _) = planner(reply);
        let task = Task::new(TaskKind::Chat, "make a tool");

        let plan = orchestrator
            .plan_workflow(&ExecutionContext::new(), &task)
            .await
            .unwrap();
        let result = orchestrator
            .execute(&ExecutionContext::new(), &plan[0])
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.data["orchestration"]["routed_to"], "development");
    }

    #[tokio::test]
    async fn test_bad_plans_fail() {
        let ctx = ExecutionContext::new();
        let task = Task::new(TaskKind::Code, "x");

        for reply in ["no plan today", "[]", r#"[{"agent": "wizard"}]"#] {
            let (orchestrator, _) = planner(reply);
            let err = orchestrator.plan_workflow(&ctx, &task).await.unwrap_err();
            assert!(matches!(err, AgentError::PlanningFailed(_)), "{reply}: {err}");
        }

        let registry = Arc::new(AgentRegistry::new());
        let orchestrator = Orchestrator::new(registry, OrchestratorConfig::default());
        assert!(matches!(
            orchestrator.plan_workflow(&ctx, &task).await,
            Err(AgentError::PlanningFailed(_))
        ));
    }
}
