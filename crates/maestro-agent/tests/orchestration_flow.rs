//! End-to-end orchestration over router-backed agents and mock backends.
#![cfg_attr(
    test,
    allow(
        clippy::tests_outside_test_module,
        clippy::missing_panics_doc,
        clippy::assertions_on_result_states,
        clippy::unwrap_used,
        reason = "Test file allows"
    )
)]

use maestro_agent::{
    AgentRegistry, AgentType, ExecutionContext, Orchestrator, ProviderSet, Sampling, Task,
    TaskContext, register_default_agents,
};
use maestro_core::{MaestroConfig, RoutingMode, TaskKind};
use maestro_providers::MockProvider;
use maestro_routing::Router;
use std::sync::Arc;

struct Harness {
    orchestrator: Orchestrator,
    router: Arc<Router>,
    groq: Arc<MockProvider>,
    kimi: Arc<MockProvider>,
}

impl Harness {
    fn prompts(&self) -> Vec<String> {
        let mut prompts = self.groq.get_call_history();
        prompts.extend(self.kimi.get_call_history());
        prompts
    }

    fn fail_backends(&self, message: &str) {
        self.groq.set_failure(Some(message.to_owned()));
        self.kimi.set_failure(Some(message.to_owned()));
    }
}

fn harness(routing_mode: RoutingMode, decider: Option<MockProvider>) -> Harness {
    let mut config = MaestroConfig::default();
    config.orchestrator.step_delay_ms = 0;
    config.orchestrator.routing_mode = routing_mode;

    let groq = Arc::new(MockProvider::new("groq").with_default_response("Backend answer"));
    let kimi = Arc::new(MockProvider::new("kimi").with_default_response("Kimi answer"));
    let providers = ProviderSet::new()
        .with_provider(groq.clone())
        .with_provider(kimi.clone());

    let router = Arc::new(Router::with_defaults());
    let registry = Arc::new(AgentRegistry::new());
    register_default_agents(
        &registry,
        &config.agents,
        Sampling::from(&config.providers),
        &router,
        &providers,
    )
    .unwrap();

    let mut orchestrator = Orchestrator::new(registry, config.orchestrator.clone());
    if let Some(decider) = decider {
        orchestrator = orchestrator.with_decider(Arc::new(decider));
    }
    Harness {
        orchestrator,
        router,
        groq,
        kimi,
    }
}

/// # Panics
/// Panics if assertions fail during test execution.
#[tokio::test]
async fn test_single_task_through_backend() {
    let harness = harness(RoutingMode::Static, None);
    let task = Task::new(TaskKind::Chat, "Say hello")
        .with_context(TaskContext::new().with_phase("initial"));

    let result = harness
        .orchestrator
        .execute(&ExecutionContext::new(), &task)
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.output.is_empty());
    assert_eq!(result.data["orchestration"]["routed_to"], "communication");
    assert_eq!(result.data["phase"], "initial");
    let model = result.data["model"].as_str().unwrap();
    assert_eq!(harness.router.tracker().get(model).unwrap().total_requests, 1);
    let evaluation = harness
        .orchestrator
        .registry()
        .evaluation(AgentType::Communication)
        .unwrap();
    assert_eq!(evaluation.successful, 1);
}

/// # Panics
/// Panics if assertions fail during test execution.
#[tokio::test]
async fn test_dynamic_routing_with_garbage_decision() {
    let decider = MockProvider::new("decider").with_default_response("route it to whoever");
    let harness = harness(RoutingMode::Dynamic, Some(decider));

    let result = harness
        .orchestrator
        .execute(&ExecutionContext::new(), &Task::new(TaskKind::Code, "Write a lexer"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.data["orchestration"]["routed_to"], "communication");
    assert_eq!(result.data["orchestration"]["fallback"], true);
}

/// # Panics
/// Panics if assertions fail during test execution.
#[tokio::test]
async fn test_auto_chain_records_pattern() {
    let harness = harness(RoutingMode::Static, None);
    let task = Task::new(TaskKind::Code, "Build a URL shortener");
    let chain = harness.orchestrator.suggest_chain(&task);
    assert_eq!(chain.len(), 4);

    let execution = harness
        .orchestrator
        .execute_chain(&ExecutionContext::new(), &task, &chain)
        .await;

    assert!(execution.success);
    assert_eq!(execution.results.len(), 4);
    assert_eq!(execution.final_output, execution.results[3].output);
    for pair in execution.results.windows(2) {
        assert!(pair[0].data["chain_step"].as_u64() < pair[1].data["chain_step"].as_u64());
    }

    // Steps after the first see the previous output in their prompt.
    let history = harness.prompts();
    assert!(history.iter().any(|prompt| prompt.contains("Previous analysis:")));

    let best = harness.orchestrator.patterns().best_for(TaskKind::Code).unwrap();
    assert_eq!(best.agent_sequence, chain);
    assert!((best.success_rate - 1.0).abs() < f64::EPSILON);
}

/// # Panics
/// Panics if assertions fail during test execution.
#[tokio::test]
async fn test_backend_outage_surfaces_as_failed_chain() {
    let harness = harness(RoutingMode::Static, None);
    harness.fail_backends("service unavailable");

    let task = Task::new(TaskKind::Chat, "Explain lifetimes");
    let execution = harness
        .orchestrator
        .execute_chain(&ExecutionContext::new(), &task, &[AgentType::Communication])
        .await;

    assert!(!execution.success);
    assert!(!execution.cancelled);
    assert!(execution.results[0].error.is_some());
}

/// # Panics
/// Panics if assertions fail during test execution.
#[tokio::test]
async fn test_cancel_during_chain() {
    let harness = harness(RoutingMode::Static, None);
    let ctx = ExecutionContext::new();
    let canceller = ctx.clone();

    let task = Task::new(TaskKind::Code, "Implement it");
    let plan = [AgentType::Analysis, AgentType::Development, AgentType::Quality];
    canceller.cancel();
    let execution = harness.orchestrator.execute_chain(&ctx, &task, &plan).await;

    assert!(execution.cancelled);
    assert!(execution.results.is_empty());
    assert!(!execution.success);
    assert!(harness.prompts().is_empty());
}
