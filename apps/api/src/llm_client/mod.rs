/// LLM Client: the single point of entry for all generative-AI calls in QuickAI.
///
/// ARCHITECTURAL RULE: No other module may talk to the provider directly.
/// Handlers and services depend on `CompletionProvider`; `LlmClient` is the
/// production implementation speaking the OpenAI-compatible chat completions
/// protocol (Gemini's compatibility endpoint by default).
///
/// One attempt per call. Retry policy belongs to whoever receives the error.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(test)]
pub mod fake;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const MAX_TEMPERATURE: f32 = 2.0;
/// Provider error bodies are echoed into logs and messages; keep them bounded.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("LLM request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited by provider: {message}")]
    RateLimited { message: String },

    #[error("Provider quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A validated completion request. Serializes directly to the wire body:
/// `{model, messages, temperature, max_tokens}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionRequest {
    /// Builds a request, rejecting a zero token budget, a temperature outside
    /// `[0, 2]`, and an empty conversation.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        if max_tokens == 0 {
            return Err(LlmError::InvalidRequest(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature must be between 0 and {MAX_TEMPERATURE}, got {temperature}"
            )));
        }
        if messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        Ok(Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
        })
    }

    /// Single user-turn request, the shape every content generator uses.
    pub fn user_prompt(
        model: impl Into<String>,
        prompt: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        Self::new(model, vec![ChatMessage::user(prompt)], temperature, max_tokens)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other(String),
}

impl FinishReason {
    fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(r) if r.eq_ignore_ascii_case("stop") => FinishReason::Stop,
            Some(r) if r.eq_ignore_ascii_case("length") => FinishReason::Length,
            Some(r) => FinishReason::Other(r.to_string()),
            None => FinishReason::Other("unspecified".to_string()),
        }
    }
}

/// The first choice of a completion. Immutable once extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Outcome of the advisory completion check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStatus {
    Complete,
    Truncated,
    Unknown(String),
}

impl CompletionStatus {
    pub fn is_complete(&self) -> bool {
        !matches!(self, CompletionStatus::Truncated)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider seam
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a `CompletionRequest` into a `CompletionResult`.
///
/// Carried in `AppState` as `Arc<dyn CompletionProvider>` so tests can
/// substitute a scripted provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn fetch_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, LlmError>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: completions_endpoint(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn fetch_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, LlmError> {
        debug!(
            "Sending completion request: model={}, messages={}, max_tokens={}, temperature={}",
            request.model(),
            request.messages().len(),
            request.max_tokens(),
            request.temperature()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, truncate_chars(&body));
            return Err(classify_api_error(status, &body));
        }

        let body = response.bytes().await?;
        let raw: Value = serde_json::from_slice(&body).map_err(|e| {
            LlmError::MalformedResponse(format!("response body is not valid JSON: {e}"))
        })?;

        if let Some(usage) = raw.get("usage") {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage["prompt_tokens"], usage["completion_tokens"]
            );
        }

        extract_completion(&raw)
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        CHAT_COMPLETIONS_PATH
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Response extraction and validation
// ────────────────────────────────────────────────────────────────────────────

/// Pulls the first choice's message text and finish reason out of a raw
/// provider response.
pub fn extract_completion(raw: &Value) -> Result<CompletionResult, LlmError> {
    let choices = raw
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices array".to_string()))?;

    let first = choices.first().ok_or_else(|| {
        LlmError::MalformedResponse("no response choices returned from LLM".to_string())
    })?;

    let text = first
        .pointer("/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            LlmError::MalformedResponse("LLM response content is not a string".to_string())
        })?;

    let finish_reason =
        FinishReason::from_wire(first.get("finish_reason").and_then(Value::as_str));

    Ok(CompletionResult {
        text: text.to_string(),
        finish_reason,
    })
}

/// Classifies the finish reason. Advisory only: never fails, only logs.
pub fn validate_completion(result: &CompletionResult) -> CompletionStatus {
    match &result.finish_reason {
        FinishReason::Stop => CompletionStatus::Complete,
        FinishReason::Length => {
            warn!(
                "LLM response truncated by max_tokens limit ({} chars returned)",
                result.text.chars().count()
            );
            CompletionStatus::Truncated
        }
        FinishReason::Other(reason) => {
            info!("LLM response finished with unknown reason: {reason}");
            CompletionStatus::Unknown(reason.clone())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider error classification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

impl ProviderErrorBody {
    fn signals_quota(&self) -> bool {
        let markers = [
            self.status.as_deref(),
            self.error_type.as_deref(),
            self.code.as_ref().and_then(Value::as_str),
        ];
        markers
            .iter()
            .flatten()
            .any(|m| m.eq_ignore_ascii_case("RESOURCE_EXHAUSTED") || *m == "insufficient_quota")
            || self.message.to_lowercase().contains("quota")
    }
}

/// Gemini's compatibility layer sometimes wraps the error object in a list.
fn parse_provider_error(body: &str) -> Option<ProviderErrorBody> {
    if let Ok(envelope) = serde_json::from_str::<ProviderErrorEnvelope>(body) {
        return Some(envelope.error);
    }
    serde_json::from_str::<Vec<ProviderErrorEnvelope>>(body)
        .ok()
        .and_then(|list| list.into_iter().next())
        .map(|envelope| envelope.error)
}

/// Maps a non-success provider response onto one `LlmError` kind.
///
/// Quota exhaustion is checked before rate limiting: both arrive as 429 but
/// need different remediation (billing vs. waiting).
pub fn classify_api_error(status: StatusCode, body: &str) -> LlmError {
    let parsed = parse_provider_error(body);

    let quota = match &parsed {
        Some(err) => err.signals_quota(),
        None => {
            let lower = body.to_lowercase();
            lower.contains("quota") || body.contains("RESOURCE_EXHAUSTED")
        }
    };

    let message = parsed
        .map(|err| err.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let message = truncate_chars(&message);

    if quota {
        LlmError::QuotaExceeded { message }
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited { message }
    } else {
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn truncate_chars(text: &str) -> String {
    text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
