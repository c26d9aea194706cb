//! Configuration types for routing, orchestration, providers and agents.

use crate::error::{Error, Result};
use crate::{Priority, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var consulted when no Groq key is configured.
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Upper bound for every configured timeout, one day.
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;

/// Complete maestro configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaestroConfig {
    /// Model router settings
    pub router: RouterConfig,
    /// Orchestrator settings
    pub orchestrator: OrchestratorConfig,
    /// Backend provider settings
    pub providers: ProvidersConfig,
    /// Per-agent settings
    pub agents: AgentsConfig,
}

/// Model router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of ranked candidates returned by a selection
    pub top_n: usize,
    /// Success rate a backend must exceed to earn the bonus
    pub improvement_threshold: f64,
    /// Multiplier applied to proven backends
    pub improvement_bonus: f64,
    /// Fitness assumed when a model has no entry for the task kind (1-10)
    pub default_fit: u8,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            improvement_threshold: 0.8,
            improvement_bonus: 1.1,
            default_fit: 6,
        }
    }
}

/// How the orchestrator picks an agent for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Static routes table, then keyword classification
    #[default]
    Static,
    /// Ask the decision backend
    Dynamic,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Agent selection strategy
    pub routing_mode: RoutingMode,
    /// Agent used when a decision cannot be honoured
    pub default_agent: String,
    /// Characters of the previous step's output carried into the next step
    pub context_truncation: usize,
    /// Pause between chain steps in milliseconds
    pub step_delay_ms: u64,
    /// Deadline for a routing decision call in seconds
    pub decision_timeout_seconds: u64,
    /// Deadline for a single agent step in seconds
    pub step_timeout_seconds: u64,
    /// Task kind to agent type, consulted in static mode
    pub static_routes: BTreeMap<String, String>,
}

impl OrchestratorConfig {
    /// Inter-step delay as a duration.
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Routing decision deadline as a duration.
    #[must_use]
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_seconds)
    }

    /// Agent step deadline as a duration.
    #[must_use]
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let static_routes = [
            ("chat", "communication"),
            ("code", "development"),
            ("reason", "analysis"),
            ("summarize", "communication"),
        ]
        .into_iter()
        .map(|(kind, agent)| (kind.to_owned(), agent.to_owned()))
        .collect();

        Self {
            routing_mode: RoutingMode::Static,
            default_agent: "communication".to_owned(),
            context_truncation: 500,
            step_delay_ms: 100,
            decision_timeout_seconds: 30,
            step_timeout_seconds: 300,
            static_routes,
        }
    }
}

/// Backend provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Groq API key
    pub groq_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible Groq endpoint
    pub groq_base_url: String,
    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Default maximum output tokens
    pub max_tokens: u32,
    /// Default sampling temperature
    pub temperature: f32,
    /// Default nucleus sampling cutoff
    pub top_p: f32,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_base_url: "https://api.groq.com/openai/v1".to_owned(),
            request_timeout_seconds: 60,
            max_tokens: 4000,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Confidence reported by agents without an override (0-10)
    pub default_confidence: f64,
    /// Overrides keyed by agent type name
    pub overrides: BTreeMap<String, AgentSettings>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            default_confidence: 7.0,
            overrides: BTreeMap::new(),
        }
    }
}

impl AgentsConfig {
    /// Resolves settings for an agent, falling back to defaults.
    #[must_use]
    pub fn settings_for(&self, agent: &str) -> AgentSettings {
        self.overrides.get(agent).cloned().unwrap_or(AgentSettings {
            confidence: Some(self.default_confidence),
            ..AgentSettings::default()
        })
    }

    /// Confidence an agent reports on success.
    #[must_use]
    pub fn confidence_for(&self, agent: &str) -> f64 {
        self.overrides
            .get(agent)
            .and_then(|settings| settings.confidence)
            .unwrap_or(self.default_confidence)
    }
}

/// Settings for a single agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Confidence reported on success (0-10)
    pub confidence: Option<f64>,
    /// Task kind the agent routes its backend calls as
    pub task_kind: Option<TaskKind>,
    /// Priority mode used for backend selection
    pub priority: Option<Priority>,
    /// Maximum output tokens
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl MaestroConfig {
    /// Get the default config directory path (`~/.maestro`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".maestro"))
    }

    /// Get the default config file path (`~/.maestro/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location (`~/.maestro/config.toml`)
    /// If the config doesn't exist, creates it with default values
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        tracing::debug!(
            "Loaded config from {:?}: routing_mode={:?}, groq_api_key={}",
            path,
            config.orchestrator.routing_mode,
            if config.providers.groq_api_key.is_some() {
                "present"
            } else {
                "missing"
            }
        );

        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Maestro Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns a configuration error naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.router.top_n == 0 {
            return Err(Error::Config("router.top_n must be at least 1".to_owned()));
        }
        if !(1..=10).contains(&self.router.default_fit) {
            return Err(Error::Config(
                "router.default_fit must be between 1 and 10".to_owned(),
            ));
        }
        if self.orchestrator.default_agent.trim().is_empty() {
            return Err(Error::Config(
                "orchestrator.default_agent must not be empty".to_owned(),
            ));
        }
        let timeouts = [
            (
                "orchestrator.decision_timeout_seconds",
                self.orchestrator.decision_timeout_seconds,
            ),
            (
                "orchestrator.step_timeout_seconds",
                self.orchestrator.step_timeout_seconds,
            ),
            (
                "providers.request_timeout_seconds",
                self.providers.request_timeout_seconds,
            ),
        ];
        for (field, seconds) in timeouts {
            if !(1..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
                return Err(Error::Config(format!(
                    "{field} must be between 1 and {MAX_TIMEOUT_SECONDS}, got {seconds}"
                )));
            }
        }
        let confidences = iter::once(self.agents.default_confidence).chain(
            self.agents
                .overrides
                .values()
                .filter_map(|settings| settings.confidence),
        );
        for confidence in confidences {
            if !(0.0..=10.0).contains(&confidence) {
                return Err(Error::Config(format!(
                    "agent confidence {confidence} is outside 0-10"
                )));
            }
        }
        Ok(())
    }

    /// Get API key for a provider, checking config first, then environment variables
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        match provider {
            "groq" => self
                .providers
                .groq_api_key
                .clone()
                .or_else(|| env::var(ENV_GROQ_API_KEY).ok()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = MaestroConfig::default();
        assert_eq!(config.router.top_n, 3);
        assert_eq!(config.orchestrator.context_truncation, 500);
        assert_eq!(config.orchestrator.default_agent, "communication");
        assert_eq!(config.orchestrator.routing_mode, RoutingMode::Static);
        assert_eq!(config.orchestrator.step_delay(), Duration::from_millis(100));
        config.validate().unwrap();
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = MaestroConfig::default();
        config.orchestrator.routing_mode = RoutingMode::Dynamic;
        config.orchestrator.context_truncation = 120;
        config.agents.overrides.insert(
            "development".to_owned(),
            AgentSettings {
                confidence: Some(9.0),
                task_kind: Some(TaskKind::Code),
                ..AgentSettings::default()
            },
        );
        config.save_to_file(&path).unwrap();

        let loaded = MaestroConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.orchestrator.routing_mode, RoutingMode::Dynamic);
        assert_eq!(loaded.orchestrator.context_truncation, 120);
        assert!((loaded.agents.confidence_for("development") - 9.0).abs() < f64::EPSILON);
        assert!((loaded.agents.confidence_for("analysis") - 7.0).abs() < f64::EPSILON);
        assert_eq!(
            loaded.agents.settings_for("development").task_kind,
            Some(TaskKind::Code)
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[orchestrator]
default_agent = "analysis"
step_delay_ms = 0

[providers]
groq_api_key = "test_groq_key_123"
"#
        )
        .unwrap();

        let config = MaestroConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.orchestrator.default_agent, "analysis");
        assert_eq!(config.orchestrator.step_delay_ms, 0);
        assert_eq!(config.orchestrator.context_truncation, 500);
        assert_eq!(config.router.top_n, 3);
        assert_eq!(
            config.get_api_key("groq").as_deref(),
            Some("test_groq_key_123")
        );
        assert!(config.get_api_key("unknown").is_none());
    }

    #[test]
    fn test_invalid_confidence_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[agents]\ndefault_confidence = 12.5\n").unwrap();

        let error = MaestroConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_timeouts_are_bounded() {
        let mut config = MaestroConfig::default();
        config.orchestrator.step_timeout_seconds = u64::MAX;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = MaestroConfig::default();
        config.providers.request_timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = MaestroConfig::default();
        config.orchestrator.decision_timeout_seconds = MAX_TIMEOUT_SECONDS;
        config.validate().unwrap();
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[router\ntop_n = ").unwrap();

        let error = MaestroConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(error, Error::Toml(_)));
    }
}
