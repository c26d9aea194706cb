//! Agent identities and the task shape that flows between agents.

use chrono::{DateTime, Utc};
use maestro_core::{Priority, Role, TaskKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::AgentError;

/// Identifier of a specialized agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Routes work to other agents
    Orchestrator,
    /// User-facing conversation
    Communication,
    /// Requirements and problem analysis
    Analysis,
    /// Code generation
    Development,
    /// Plans and roadmaps
    Strategy,
    /// Release and infrastructure
    Deployment,
    /// Review and testing
    Quality,
    /// Observability setup
    Monitoring,
    /// Third-party integrations
    Integration,
    /// System design
    Architect,
    /// Tunes other agents and tools
    Recommender,
    /// Multi-model gateway
    AiProviders,
}

impl AgentType {
    /// All agent types in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 12] {
        [
            Self::Orchestrator,
            Self::Communication,
            Self::Analysis,
            Self::Development,
            Self::Strategy,
            Self::Deployment,
            Self::Quality,
            Self::Monitoring,
            Self::Integration,
            Self::Architect,
            Self::Recommender,
            Self::AiProviders,
        ]
    }

    /// Stable snake_case identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Communication => "communication",
            Self::Analysis => "analysis",
            Self::Development => "development",
            Self::Strategy => "strategy",
            Self::Deployment => "deployment",
            Self::Quality => "quality",
            Self::Monitoring => "monitoring",
            Self::Integration => "integration",
            Self::Architect => "architect",
            Self::Recommender => "recommender",
            Self::AiProviders => "ai_providers",
        }
    }
}

impl Display for AgentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "architecture" => Ok(Self::Architect),
            "ai_provider" => Ok(Self::AiProviders),
            other => Self::all()
                .into_iter()
                .find(|agent| agent.as_str() == other)
                .ok_or_else(|| AgentError::UnknownAgentType(value.to_owned())),
        }
    }
}

/// Something an agent can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Short identifier
    pub name: String,
    /// What the capability covers
    pub description: String,
    /// Whether the agent always provides it
    pub required: bool,
}

impl Capability {
    /// Creates a capability.
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
        }
    }
}

/// Public description of a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Agent identity
    pub agent_type: AgentType,
    /// Human-readable description
    pub description: String,
    /// Advertised capabilities
    pub capabilities: Vec<Capability>,
}

/// A message in the conversation carried by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Author
    pub role: Role,
    /// Text
    pub content: String,
    /// When the message was added
    pub timestamp: DateTime<Utc>,
}

impl HistoryMessage {
    /// Creates a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Session state travelling with a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Conversation session
    pub session_id: Uuid,
    /// Workflow phase, e.g. `initial` or `implementation`
    pub phase: String,
    /// Free-form memory shared between agents
    pub memory: Map<String, Value>,
    /// Earlier messages, oldest first
    pub history: Vec<HistoryMessage>,
    /// String tags
    pub metadata: BTreeMap<String, String>,
}

impl TaskContext {
    /// Creates an empty context in a new session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: String::new(),
            memory: Map::new(),
            history: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the workflow phase.
    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of work handed to an agent.
///
/// Tasks are never mutated in place while chaining; each step works on a
/// derived copy (see [`Task::enriched`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Kind of work
    pub kind: TaskKind,
    /// Request text
    pub input: String,
    /// Structured parameters
    pub parameters: Map<String, Value>,
    /// Session state
    pub context: TaskContext,
    /// Speed/quality/cost preference
    pub priority: Priority,
    /// Per-task deadline, tighter than the orchestrator's step timeout when set
    pub timeout: Option<Duration>,
}

impl Task {
    /// Creates a task with a fresh context.
    pub fn new(kind: TaskKind, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            input: input.into(),
            parameters: Map::new(),
            context: TaskContext::new(),
            priority: Priority::default(),
            timeout: None,
        }
    }

    /// Sets the priority mode.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the context.
    #[must_use]
    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Sets a deadline for this task.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Agent assigned to this task by a workflow plan, if any.
    #[must_use]
    pub fn assigned_agent(&self) -> Option<AgentType> {
        self.parameters
            .get("agent")
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok())
    }

    /// Derives the task for the next chain step.
    ///
    /// The input is prefixed with at most `limit` characters of `previous`
    /// and the whole of `previous` is appended to the history as an
    /// assistant message.
    #[must_use]
    pub fn enriched(&self, previous: &str, limit: usize) -> Self {
        let mut next = self.clone();
        next.input = format!(
            "Previous analysis:\n{}\n\nNow, {}",
            truncate_output(previous, limit),
            self.input
        );
        next.context
            .history
            .push(HistoryMessage::new(Role::Assistant, previous));
        next
    }
}

/// Shortens `output` to `limit` characters, appending `...` when cut.
///
/// Cuts on a character boundary so multi-byte text never splits.
#[must_use]
pub fn truncate_output(output: &str, limit: usize) -> String {
    match output.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &output[..cut]),
        None => output.to_owned(),
    }
}
