//! Mock provider for testing agent responses.
//!
//! Allows defining canned responses for specific prompts, enabling
//! end-to-end testing of routing and orchestration without real API calls.
//! The same provider backs the CLI's offline mode.

use async_trait::async_trait;
use maestro_core::{
    Error, IgnoreLock as _, ModelProvider, Request, Response, Result, StreamCallback, TokenUsage,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Ordered pattern table; the first registered matching pattern wins.
type PatternList = Arc<Mutex<Vec<(String, String)>>>;

/// Mock provider that returns pre-defined responses based on prompt patterns.
#[derive(Clone)]
pub struct MockProvider {
    /// Provider label reported by [`ModelProvider::name`]
    name: String,
    /// Responses handed out once each, before any pattern is consulted
    queued: Arc<Mutex<VecDeque<String>>>,
    /// Predefined responses keyed by prompt substring
    responses: PatternList,
    /// Default response if no match found
    default_response: Arc<Mutex<Option<String>>>,
    /// Error message returned by every call while set
    failure: Arc<Mutex<Option<String>>>,
    /// Answer of [`ModelProvider::is_available`]
    available: Arc<AtomicBool>,
    /// Artificial latency applied before answering
    delay: Option<Duration>,
    /// Confidence attached to every response
    confidence: f64,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with a given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
            available: Arc::new(AtomicBool::new(true)),
            delay: None,
            confidence: 0.9,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a pattern-based response to the mock provider.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .lock_ignore_poison()
            .push((pattern.into(), response.into()));
        self
    }

    /// Queue a response returned by the next unanswered call regardless of the prompt.
    #[must_use]
    pub fn with_queued_response(self, response: impl Into<String>) -> Self {
        self.queue_response(response);
        self
    }

    /// Set a default response for prompts that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default_response.lock_ignore_poison() = Some(response.into());
        self
    }

    /// Make every call sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the confidence reported on responses.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Make every call fail with a provider error.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.set_failure(Some(message.into()));
        self
    }

    /// Queue a response on a shared handle.
    pub fn queue_response(&self, response: impl Into<String>) {
        self.queued.lock_ignore_poison().push_back(response.into());
    }

    /// Report the provider as unavailable without failing calls made anyway.
    #[must_use]
    pub fn with_unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    /// Toggle the availability reported on a shared handle.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Toggle failure injection on a shared handle.
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock_ignore_poison() = message;
    }

    /// Clear the call history (used for testing).
    pub fn clear_history(&self) {
        self.call_history.lock_ignore_poison().clear();
    }

    /// Get the call history (full prompt of every call made).
    #[must_use]
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock_ignore_poison().clone()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock_ignore_poison().len()
    }

    /// Flattens the conversation into the text patterns are matched against.
    fn prompt_text(request: &Request) -> String {
        request
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Find a matching response for the given prompt text.
    fn find_response(&self, prompt: &str) -> Option<String> {
        if let Some(queued) = self.queued.lock_ignore_poison().pop_front() {
            return Some(queued);
        }

        let responses = self.responses.lock_ignore_poison();
        responses
            .iter()
            .find(|(pattern, _)| prompt == pattern)
            .or_else(|| responses.iter().find(|(pattern, _)| prompt.contains(pattern.as_str())))
            .map(|(_, response)| response.clone())
    }

    /// Shared path of `complete` and `stream`.
    async fn answer(&self, request: &Request) -> Result<Response> {
        let prompt = Self::prompt_text(request);
        self.call_history.lock_ignore_poison().push(prompt.clone());

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let failure = self.failure.lock_ignore_poison().clone();
        if let Some(message) = failure {
            return Err(Error::Provider(message));
        }

        let text = self.find_response(&prompt).unwrap_or_else(|| {
            self.default_response
                .lock_ignore_poison()
                .clone()
                .unwrap_or_else(|| format!("Mock response for prompt: {prompt}"))
        });

        Ok(Response {
            tokens_used: TokenUsage {
                input: (prompt.len() / 4) as u64,
                output: (text.len() / 4) as u64,
            },
            text,
            confidence: self.confidence,
            provider: self.name.clone(),
            model: request.model.clone().unwrap_or_else(|| "mock".to_owned()),
            latency_ms: self.delay.map_or(0, |delay| delay.as_millis() as u64),
        })
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: &Request) -> Result<Response> {
        self.answer(request).await
    }

    async fn stream(
        &self,
        request: &Request,
        callback: &mut StreamCallback<'_>,
    ) -> Result<Response> {
        let response = self.answer(request).await?;
        for chunk in response.text.split_inclusive(' ') {
            callback(chunk)?;
        }
        Ok(response)
    }

    async fn health_check(&self) -> Result<()> {
        match self.failure.lock_ignore_poison().as_ref() {
            Some(message) => Err(Error::Provider(message.clone())),
            None => Ok(()),
        }
    }
}
