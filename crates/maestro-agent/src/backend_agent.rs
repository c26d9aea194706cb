//! Agents that answer by routing the task to a language model backend.

use async_trait::async_trait;
use maestro_core::{AgentsConfig, Message, ModelProvider, ProvidersConfig, Request, Role};
use maestro_routing::{Router, SelectOptions};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::context::ExecutionContext;
use crate::profiles::{AgentProfile, default_profiles};
use crate::registry::AgentRegistry;
use crate::result::{AgentResult, ErrorKind, ResultError};
use crate::types::{AgentType, Capability, Task};
use crate::{AgentError, Result};

/// Backends keyed by provider label.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
}

impl ProviderSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider under its own name.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.insert(provider);
        self
    }

    /// Adds a provider under its own name, replacing any previous one.
    pub fn insert(&mut self, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Looks up a provider by label.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(name).cloned()
    }

    /// Provider labels, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs every provider's health check.
    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        let mut health = BTreeMap::new();
        for (name, provider) in &self.providers {
            let healthy = match provider.health_check().await {
                Ok(()) => true,
                Err(err) => {
                    warn!(provider = %name, error = %err, "Provider health check failed");
                    false
                }
            };
            health.insert(name.clone(), healthy);
        }
        health
    }
}

/// Request shaping shared by every backend agent.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
}

impl From<&ProvidersConfig> for Sampling {
    fn from(config: &ProvidersConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// A generic agent: asks the router for candidates, calls the first backend
/// whose provider is configured and reports itself available, and reports
/// its configured confidence.
pub struct BackendAgent {
    profile: AgentProfile,
    /// Confidence reported on success (0-10)
    confidence: f64,
    sampling: Sampling,
    router: Arc<Router>,
    providers: ProviderSet,
}

impl BackendAgent {
    /// Creates an agent, resolving per-agent overrides from `agents`.
    #[must_use]
    pub fn new(
        mut profile: AgentProfile,
        agents: &AgentsConfig,
        sampling: Sampling,
        router: Arc<Router>,
        providers: ProviderSet,
    ) -> Self {
        let settings = agents.settings_for(profile.agent_type.as_str());
        if let Some(task_kind) = settings.task_kind {
            profile.task_kind = task_kind;
        }
        if let Some(priority) = settings.priority {
            profile.priority = priority;
        }
        let sampling = Sampling {
            max_tokens: settings.max_tokens.unwrap_or(sampling.max_tokens),
            temperature: settings.temperature.unwrap_or(sampling.temperature),
            top_p: sampling.top_p,
        };

        Self {
            confidence: agents.confidence_for(profile.agent_type.as_str()),
            profile,
            sampling,
            router,
            providers,
        }
    }

    fn build_request(&self, task: &Task) -> Request {
        let system = if task.context.phase.is_empty() {
            self.profile.system_prompt.to_owned()
        } else {
            format!("{}\nCurrent phase: {}", self.profile.system_prompt, task.context.phase)
        };

        let mut messages = vec![Message::system(system)];
        messages.extend(
            task.context
                .history
                .iter()
                .map(|entry| Message::new(entry.role, entry.content.clone())),
        );
        messages.push(Message::new(Role::User, task.input.clone()));

        Request::new(messages)
            .with_max_tokens(self.sampling.max_tokens)
            .with_sampling(self.sampling.temperature, self.sampling.top_p)
            .with_task_hint(self.profile.task_kind)
    }
}

#[async_trait]
impl Agent for BackendAgent {
    fn agent_type(&self) -> AgentType {
        self.profile.agent_type
    }

    fn description(&self) -> &str {
        self.profile.description
    }

    fn capabilities(&self) -> Vec<Capability> {
        self.profile.capability_list()
    }

    async fn execute(&self, ctx: &ExecutionContext, task: &Task) -> Result<AgentResult> {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_millis() as u64;
        let request = self.build_request(task);
        let options = SelectOptions::new(self.profile.task_kind)
            .with_input_tokens(request.token_estimate())
            .with_priority(self.profile.priority);

        let candidates = match self.router.select(&options) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(agent = %self.profile.agent_type, error = %err, "No backend for task");
                return Ok(AgentResult::failure(ResultError::from_error(&AgentError::from(err)))
                    .with_execution_ms(elapsed_ms()));
            }
        };

        let mut selected = None;
        for candidate in candidates {
            let Some(provider) = self.providers.get(&candidate.model.provider) else {
                continue;
            };
            if provider.is_available().await {
                selected = Some((candidate, provider));
                break;
            }
            debug!(
                agent = %self.profile.agent_type,
                provider = %candidate.model.provider,
                "Skipping unavailable provider"
            );
        }
        let Some((candidate, provider)) = selected else {
            return Ok(AgentResult::failure(ResultError::new(
                ErrorKind::Routing,
                "No available provider for any candidate model",
            ))
            .with_execution_ms(elapsed_ms()));
        };

        let model = candidate.model.name.clone();
        debug!(agent = %self.profile.agent_type, model = %model, why = %candidate.why, "Calling backend");
        let request = request.with_model(model.clone());
        let call_start = Instant::now();

        match ctx.guard(provider.complete(&request)).await {
            Ok(response) => {
                self.router
                    .record_outcome(&model, true, call_start.elapsed(), response.confidence)?;

                let mut result = AgentResult::success(response.text, self.confidence)
                    .with_data("model", response.model)
                    .with_data("provider", response.provider)
                    .with_data("backend_confidence", response.confidence)
                    .with_data("tokens_used", response.tokens_used.total())
                    .with_data("why", candidate.why)
                    .with_execution_ms(elapsed_ms());
                if !task.context.phase.is_empty() {
                    result = result.with_data("phase", json!(task.context.phase));
                }
                if let Some(next) = self.profile.handoff_for(&result.output) {
                    result = result
                        .with_next_agent(next)
                        .with_suggestion(format!("Consider handing off to the {next} agent"));
                }
                Ok(result)
            }
            Err(err) => {
                let err = AgentError::from(err);
                if !err.is_cancelled() {
                    self.router
                        .record_outcome(&model, false, call_start.elapsed(), 0.0)?;
                }
                warn!(agent = %self.profile.agent_type, model = %model, error = %err, "Backend call failed");
                let retryable = err.is_retryable();
                let mut result = AgentResult::failure(ResultError::from_error(&err))
                    .with_data("model", model)
                    .with_data("retryable", retryable)
                    .with_execution_ms(elapsed_ms());
                if retryable {
                    result = result.with_suggestion("The backend error looks transient, retry later");
                }
                Ok(result)
            }
        }
    }
}

/// Registers a [`BackendAgent`] for every default profile.
///
/// # Errors
/// Returns [`AgentError::AlreadyRegistered`] if any of the types is taken.
pub fn register_default_agents(
    registry: &AgentRegistry,
    agents: &AgentsConfig,
    sampling: Sampling,
    router: &Arc<Router>,
    providers: &ProviderSet,
) -> Result<()> {
    for profile in default_profiles() {
        registry.register(Arc::new(BackendAgent::new(
            profile,
            agents,
            sampling,
            Arc::clone(router),
            providers.clone(),
        )))?;
    }
    Ok(())
}
