//! Wiring configuration, backends, router, agents and orchestrator together.

use anyhow::{Context as _, Result};
use maestro_agent::{AgentRegistry, Orchestrator, ProviderSet, Sampling, register_default_agents};
use maestro_core::{MaestroConfig, ModelProvider, RoutingMode};
use maestro_providers::{GroqProvider, MockProvider};
use maestro_routing::{Catalog, PerformanceTracker, Router};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Canned answer returned by offline backends.
const OFFLINE_RESPONSE: &str =
    "Offline mode: no hosted backend was called. Configure GROQ_API_KEY to get real answers.";

/// Everything a command needs.
pub struct Runtime {
    pub config: MaestroConfig,
    pub router: Arc<Router>,
    pub providers: ProviderSet,
    pub orchestrator: Orchestrator,
}

/// Loads configuration from `path`, or from `~/.maestro/config.toml`.
///
/// An explicit path that does not exist yields defaults without creating
/// the file.
///
/// # Errors
/// Returns an error if an explicit file cannot be parsed or the resulting
/// configuration is invalid.
pub fn load_config(path: Option<&Path>) -> Result<MaestroConfig> {
    let config = match path {
        Some(path) if path.exists() => MaestroConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        Some(_) => MaestroConfig::default(),
        None => MaestroConfig::load_or_create().unwrap_or_else(|error| {
            warn!("Failed to load config from ~/.maestro/config.toml: {error}");
            warn!("Using default configuration");
            MaestroConfig::default()
        }),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

impl Runtime {
    /// Builds the runtime from `config`.
    ///
    /// Hosted backends are used when an API key is configured and `offline`
    /// is unset. Otherwise every catalog provider is served by a mock.
    ///
    /// # Errors
    /// Returns an error if a backend client cannot be created.
    pub fn build(config: MaestroConfig, offline: bool) -> Result<Self> {
        let (providers, decider) = Self::providers(&config, offline)?;

        let router = Arc::new(Router::new(
            Catalog::with_defaults(),
            Arc::new(PerformanceTracker::new()),
            config.router.clone(),
        ));
        let registry = Arc::new(AgentRegistry::new());
        register_default_agents(
            &registry,
            &config.agents,
            Sampling::from(&config.providers),
            &router,
            &providers,
        )?;

        let orchestrator =
            Orchestrator::new(registry, config.orchestrator.clone()).with_decider(decider);
        Ok(Self {
            config,
            router,
            providers,
            orchestrator,
        })
    }

    fn providers(
        config: &MaestroConfig,
        offline: bool,
    ) -> Result<(ProviderSet, Arc<dyn ModelProvider>)> {
        let api_key = if offline { None } else { config.get_api_key("groq") };

        if let Some(api_key) = api_key {
            let groq: Arc<dyn ModelProvider> =
                Arc::new(GroqProvider::from_config(&config.providers, api_key)?);
            info!("Using hosted groq backend");
            return Ok((ProviderSet::new().with_provider(Arc::clone(&groq)), groq));
        }

        if !offline {
            warn!("No groq API key configured, falling back to offline backends");
        }
        let mut providers = ProviderSet::new();
        for provider in Catalog::with_defaults().providers() {
            providers.insert(Arc::new(
                MockProvider::new(provider).with_default_response(OFFLINE_RESPONSE),
            ));
        }
        let decider: Arc<dyn ModelProvider> =
            Arc::new(MockProvider::new("decider").with_default_response(OFFLINE_RESPONSE));
        Ok((providers, decider))
    }

    /// Switches the orchestrator to backend-decided routing.
    pub fn use_dynamic_routing(&mut self) {
        self.config.orchestrator.routing_mode = RoutingMode::Dynamic;
        let registry = Arc::clone(self.orchestrator.registry());
        let mut orchestrator = Orchestrator::new(registry, self.config.orchestrator.clone());
        if let Some(decider) = self.orchestrator.decider() {
            orchestrator = orchestrator.with_decider(decider);
        }
        self.orchestrator = orchestrator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_agent::AgentType;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_offline_runtime_registers_agents() {
        let runtime = Runtime::build(MaestroConfig::default(), true).unwrap();
        let agents = runtime.orchestrator.registry().list_agents();
        assert_eq!(agents.len(), AgentType::all().len() - 1);
        assert_eq!(runtime.providers.names(), vec!["groq", "kimi"]);
    }

    #[test]
    fn test_dynamic_switch_keeps_decider() {
        let mut runtime = Runtime::build(MaestroConfig::default(), true).unwrap();
        runtime.use_dynamic_routing();
        assert_eq!(
            runtime.orchestrator.config().routing_mode,
            RoutingMode::Dynamic
        );
        assert!(runtime.orchestrator.decider().is_some());
    }

    #[test]
    fn test_missing_explicit_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.orchestrator.default_agent, "communication");
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        fs::write(&path, "router = 7").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
