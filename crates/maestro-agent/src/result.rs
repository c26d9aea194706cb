//! Agent execution results.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::AgentError;
use crate::types::AgentType;

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: f64 = 10.0;

/// Category of a failed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend call failed
    Backend,
    /// A deadline passed
    Timeout,
    /// The caller cancelled
    Cancelled,
    /// No backend could be selected
    Routing,
    /// The agent itself failed
    Agent,
}

/// Structured error carried inside a failed [`AgentResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl ResultError {
    /// Creates a result error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifies an agent error.
    #[must_use]
    pub fn from_error(error: &AgentError) -> Self {
        let kind = if error.is_cancelled() {
            ErrorKind::Cancelled
        } else if error.is_timeout() {
            ErrorKind::Timeout
        } else {
            match error {
                AgentError::Routing(_) => ErrorKind::Routing,
                AgentError::Core(_) => ErrorKind::Backend,
                _ => ErrorKind::Agent,
            }
        };
        Self::new(kind, error.to_string())
    }
}

impl Display for ResultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

fn clamped_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_confidence)
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, MAX_CONFIDENCE)
    }
}

/// Outcome of one agent execution.
///
/// Expected failures are reported here with `success == false` and a
/// populated `error`; they are not `Err` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the agent accomplished the task
    pub success: bool,
    /// Free-form output text
    pub output: String,
    /// Structured data attached by the agent and the orchestrator
    pub data: Map<String, Value>,
    /// Suggested follow-up step
    pub next_step: Option<String>,
    /// Suggested follow-up agent
    pub next_agent: Option<AgentType>,
    /// Confidence on the 0-10 scale
    #[serde(deserialize_with = "clamped_confidence")]
    confidence: f64,
    /// Wall time spent in milliseconds
    pub execution_ms: u64,
    /// Failure detail
    pub error: Option<ResultError>,
    /// Hints for the caller
    pub suggestions: Vec<String>,
}

impl AgentResult {
    /// A successful result.
    pub fn success(output: impl Into<String>, confidence: f64) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: Map::new(),
            next_step: None,
            next_agent: None,
            confidence: clamp_confidence(confidence),
            execution_ms: 0,
            error: None,
            suggestions: Vec::new(),
        }
    }

    /// A failed result with zero confidence.
    #[must_use]
    pub fn failure(error: ResultError) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::success(String::new(), 0.0)
        }
    }

    /// Confidence on the 0-10 scale.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Replaces the confidence, clamping into `[0, 10]`.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    /// Attaches a data entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Suggests the next agent.
    #[must_use]
    pub fn with_next_agent(mut self, agent: AgentType) -> Self {
        self.next_agent = Some(agent);
        self
    }

    /// Suggests the next step.
    #[must_use]
    pub fn with_next_step(mut self, step: impl Into<String>) -> Self {
        self.next_step = Some(step.into());
        self
    }

    /// Adds a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Sets the measured duration.
    #[must_use]
    pub fn with_execution_ms(mut self, execution_ms: u64) -> Self {
        self.execution_ms = execution_ms;
        self
    }

    /// Whether the failure came from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|error| error.kind == ErrorKind::Cancelled)
    }
}
