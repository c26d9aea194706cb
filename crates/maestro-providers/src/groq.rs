use async_trait::async_trait;
use futures::StreamExt as _;
use maestro_core::{
    Error, Message, ModelProvider, ProvidersConfig, Request, Response, Result, StreamCallback,
    TaskKind, TokenUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default Groq API base URL.
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Env var key for Groq API key.
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Fast model used for light tasks and as the fallback.
const SMALL_MODEL: &str = "llama-3.1-8b-instant";
/// Balanced model for reasoning.
const MEDIUM_MODEL: &str = "mixtral-8x7b-32768";
/// Highest quality model for code and orchestration.
const LARGE_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq API provider speaking the OpenAI-compatible chat completion protocol.
pub struct GroqProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Groq API key.
    api_key: String,
    /// Base URL without the trailing endpoint path.
    base_url: String,
}

impl GroqProvider {
    /// Creates a new `GroqProvider` from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the `GROQ_API_KEY` environment variable is not set.
    pub fn new() -> Result<Self> {
        let api_key =
            env::var(ENV_GROQ_API_KEY).map_err(|_| Error::MissingApiKey(ENV_GROQ_API_KEY.to_owned()))?;
        Self::with_api_key_direct(api_key)
    }

    /// Creates a new `GroqProvider` with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provided API key is empty.
    pub fn with_api_key_direct(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_GROQ_API_KEY.to_owned()));
        }

        Ok(Self {
            client: Client::default(),
            api_key,
            base_url: GROQ_BASE_URL.to_owned(),
        })
    }

    /// Creates a provider honouring the configured base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn from_config(config: &ProvidersConfig, api_key: String) -> Result<Self> {
        let provider = Self::with_api_key_direct(api_key)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.groq_base_url.trim_end_matches('/').to_owned(),
            ..provider
        })
    }

    /// Picks a model size from the task hint.
    fn select_model(task: Option<TaskKind>) -> &'static str {
        match task {
            Some(TaskKind::Code | TaskKind::Orchestration) => LARGE_MODEL,
            Some(TaskKind::Reason) => MEDIUM_MODEL,
            Some(
                TaskKind::Chat | TaskKind::Summarize | TaskKind::Extract | TaskKind::Embedding,
            )
            | None => SMALL_MODEL,
        }
    }

    /// Resolves the model for a request, preferring an explicit pin.
    fn resolve_model(request: &Request) -> String {
        request
            .model
            .clone()
            .unwrap_or_else(|| Self::select_model(request.task_hint).to_owned())
    }

    /// Derives a `[0, 1]` confidence from model size and completion length.
    fn calculate_confidence(model: &str, completion_tokens: u64) -> f64 {
        let size_bonus: f64 = match model {
            LARGE_MODEL => 0.15,
            MEDIUM_MODEL => 0.1,
            _ => 0.05,
        };
        let length_bonus = if completion_tokens > 100 { 0.05 } else { 0.0 };
        (0.7 + size_bonus + length_bonus).min(0.95)
    }

    /// Builds the wire payload for a request.
    fn build_body(request: &Request, model: &str, stream: bool) -> GroqRequest {
        GroqRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(GroqMessage::from).collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    /// Posts a payload and checks the HTTP status.
    async fn send(&self, body: &GroqRequest) -> Result<reqwest::Response> {
        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    Error::Timeout(started.elapsed().as_millis() as u64)
                } else {
                    Error::Provider(format!("Groq API request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            warn!(%status, model = %body.model, "Groq API returned an error");
            return Err(Error::Provider(format!(
                "Groq API error {status}: {error_text}"
            )));
        }

        Ok(response)
    }
}

/// Request payload sent to the Groq chat completion API.
#[derive(Debug, Serialize)]
struct GroqRequest {
    /// Model identifier provided by the Groq service.
    model: String,
    /// Messages that form the conversation context for the request.
    messages: Vec<GroqMessage>,
    /// Sampling temperature controlling response randomness.
    temperature: f32,
    /// Nucleus sampling cutoff.
    top_p: f32,
    /// Maximum number of tokens allowed in the completion.
    max_tokens: u32,
    /// Whether to stream server-sent events.
    stream: bool,
}

/// Message delivered to the Groq API.
#[derive(Debug, Serialize)]
struct GroqMessage {
    /// Role of the message author (for example `system` or `user`).
    role: String,
    /// Textual content of the message.
    content: String,
}

impl From<&Message> for GroqMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
        }
    }
}

/// Response payload returned by Groq.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    /// List of candidate completions.
    choices: Vec<GroqChoice>,
    /// Token accounting information for the request.
    usage: GroqUsage,
}

/// A single completion choice returned by Groq.
#[derive(Debug, Deserialize)]
struct GroqChoice {
    /// Message generated for the choice.
    message: GroqResponseMessage,
}

/// Response message containing the generated text.
#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    /// Generated text content.
    content: String,
}

/// Token usage metrics for a Groq response.
#[derive(Debug, Default, Deserialize)]
struct GroqUsage {
    /// Number of tokens in the prompt portion of the request.
    #[serde(default)]
    prompt_tokens: u64,
    /// Number of tokens produced in the completion.
    #[serde(default)]
    completion_tokens: u64,
}

impl From<&GroqUsage> for TokenUsage {
    fn from(usage: &GroqUsage) -> Self {
        Self {
            input: usage.prompt_tokens,
            output: usage.completion_tokens,
        }
    }
}

/// One server-sent event chunk of a streamed completion.
#[derive(Debug, Deserialize)]
struct GroqStreamChunk {
    /// Incremental choices.
    #[serde(default)]
    choices: Vec<GroqStreamChoice>,
    /// OpenAI-style usage, sent by some deployments on the final chunk.
    #[serde(default)]
    usage: Option<GroqUsage>,
    /// Groq request metadata; carries usage on the final chunk.
    #[serde(default)]
    x_groq: Option<GroqExtension>,
}

impl GroqStreamChunk {
    /// Usage reported by this chunk, wherever the server put it.
    fn usage(&self) -> Option<&GroqUsage> {
        self.usage
            .as_ref()
            .or_else(|| self.x_groq.as_ref().and_then(|extension| extension.usage.as_ref()))
    }
}

/// The `x_groq` object attached to every stream chunk.
#[derive(Debug, Deserialize)]
struct GroqExtension {
    /// Usage, present only on the final chunk.
    #[serde(default)]
    usage: Option<GroqUsage>,
}

/// Incremental choice inside a stream chunk.
#[derive(Debug, Deserialize)]
struct GroqStreamChoice {
    /// Text delta.
    delta: GroqDelta,
}

/// Text delta of a stream chunk.
#[derive(Debug, Deserialize)]
struct GroqDelta {
    /// Newly generated text, absent on role-only deltas.
    #[serde(default)]
    content: Option<String>,
}

/// A parsed line of the event stream.
#[derive(Debug)]
enum SseLine {
    /// A data chunk
    Chunk(GroqStreamChunk),
    /// The terminating `[DONE]` marker
    Done,
    /// Blank lines, comments and non-data fields
    Ignore,
}

/// Parses one line of a server-sent event stream.
fn parse_sse_line(line: &str) -> Result<SseLine> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(SseLine::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Ignore);
    }
    let chunk = serde_json::from_str(data)
        .map_err(|err| Error::InvalidResponse(format!("Malformed Groq stream chunk: {err}")))?;
    Ok(SseLine::Chunk(chunk))
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, request: &Request) -> Result<Response> {
        let start = Instant::now();
        let model = Self::resolve_model(request);
        let body = Self::build_body(request, &model, false);

        let groq_response: GroqResponse = self
            .send(&body)
            .await?
            .json()
            .await
            .map_err(|err| Error::InvalidResponse(format!("Failed to parse Groq response: {err}")))?;

        let text = groq_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::InvalidResponse("No response from Groq".to_owned()))?;

        let tokens_used = TokenUsage::from(&groq_response.usage);
        debug!(
            model = %model,
            input_tokens = tokens_used.input,
            output_tokens = tokens_used.output,
            ms = start.elapsed().as_millis() as u64,
            "Groq completion finished"
        );

        Ok(Response {
            text,
            confidence: Self::calculate_confidence(&model, tokens_used.output),
            tokens_used,
            provider: "groq".to_owned(),
            model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn stream(
        &self,
        request: &Request,
        callback: &mut StreamCallback<'_>,
    ) -> Result<Response> {
        let start = Instant::now();
        let model = Self::resolve_model(request);
        let body = Self::build_body(request, &model, true);
        let mut bytes = self.send(&body).await?.bytes_stream();

        let mut pending: Vec<u8> = Vec::new();
        let mut text = String::new();
        let mut tokens_used = TokenUsage::default();

        'events: while let Some(chunk) = bytes.next().await {
            pending.extend_from_slice(&chunk?);
            while let Some(newline) = pending.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                match parse_sse_line(&String::from_utf8_lossy(&line))? {
                    SseLine::Chunk(event) => {
                        if let Some(usage) = event.usage() {
                            tokens_used = TokenUsage::from(usage);
                        }
                        for choice in event.choices {
                            if let Some(content) =
                                choice.delta.content.filter(|piece| !piece.is_empty())
                            {
                                callback(&content)?;
                                text.push_str(&content);
                            }
                        }
                    }
                    SseLine::Done => break 'events,
                    SseLine::Ignore => {}
                }
            }
        }

        Ok(Response {
            text,
            confidence: Self::calculate_confidence(&model, tokens_used.output),
            tokens_used,
            provider: "groq".to_owned(),
            model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<()> {
        let probe = Request::new(vec![Message::user("hi")])
            .with_max_tokens(5)
            .with_model(SMALL_MODEL);
        self.complete(&probe).await.map(|_| ())
    }
}
