use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::TaskKind;

/// Author of a message sent to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The requesting party
    User,
    /// Earlier backend output
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::System => f.write_str("system"),
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Creates a message with the given role.
    pub fn new<T: Into<String>>(role: Role, content: T) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A request to a text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Conversation sent to the backend, oldest first
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Hint used by the backend to pick a model size
    pub task_hint: Option<TaskKind>,
    /// Explicit model to use, overriding the backend's own selection
    pub model: Option<String>,
    /// Free-form metadata forwarded to the backend
    pub metadata: Map<String, Value>,
}

impl Request {
    /// Creates a request with default sampling settings.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: 2000,
            temperature: 0.7,
            top_p: 0.9,
            task_hint: None,
            model: None,
            metadata: Map::new(),
        }
    }

    /// Sets the maximum output size.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling controls.
    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    /// Sets the task-kind hint.
    #[must_use]
    pub fn with_task_hint(mut self, task: TaskKind) -> Self {
        self.task_hint = Some(task);
        self
    }

    /// Pins the request to a specific model.
    #[must_use]
    pub fn with_model<T: Into<String>>(mut self, model: T) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Rough token estimate of the whole conversation (four bytes per token).
    #[must_use]
    pub fn token_estimate(&self) -> usize {
        self.messages
            .iter()
            .map(|message| message.content.len())
            .sum::<usize>()
            / 4
    }
}

/// A completed backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Generated text
    pub text: String,
    /// Derived confidence in `[0, 1]`
    pub confidence: f64,
    /// Token accounting
    pub tokens_used: TokenUsage,
    /// Provider label that produced the response
    pub provider: String,
    /// Model that produced the response
    pub model: String,
    /// Measured round trip in milliseconds
    pub latency_ms: u64,
}

/// Token accounting for a single backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input: u64,
    /// Completion tokens
    pub output: u64,
}

impl TokenUsage {
    /// Total tokens billed for the call.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = Request::new(vec![Message::system("be brief"), Message::user("hi")])
            .with_max_tokens(64)
            .with_sampling(0.2, 0.5)
            .with_task_hint(TaskKind::Chat)
            .with_model("llama-3.1-8b-instant");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.task_hint, Some(TaskKind::Chat));
        assert_eq!(request.model.as_deref(), Some("llama-3.1-8b-instant"));
    }

    #[test]
    fn test_token_estimate() {
        let request = Request::new(vec![Message::user("x".repeat(400))]);
        assert_eq!(request.token_estimate(), 100);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input: 12,
            output: 30,
        };
        assert_eq!(usage.total(), 42);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("done")).unwrap();
        assert!(json.contains("\"assistant\""));
    }
}
