/// LLM Client — the single point of entry for text-generation calls.
///
/// No other module calls the OpenAI API directly. Handlers depend on the
/// `TextGenerator` trait so the concrete client is chosen in `main` and tests can
/// substitute a canned generator.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::retry::{retry_with_backoff, Backoff, RetryDecision, RetryFailure};

/// Default model for post generation. Overridable via `OPENAI_MODEL`.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Name under which the output schema is registered with the API.
pub const OUTPUT_SCHEMA_NAME: &str = "social_media_posts";

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Failure surfaced to callers after the retry policy has run its course.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Generation request rejected (status {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Rate limit exceeded after {attempts} attempts. Please try again later.")]
    RateLimited { attempts: u32 },

    #[error("Generation service temporarily unavailable after {attempts} attempts: {message}")]
    ServiceUnavailable { attempts: u32, message: String },

    #[error("Generation failed after {attempts} attempts: {message}")]
    Failed { attempts: u32, message: String },

    #[error("Generated output did not match the expected schema: {0}")]
    Parse(String),
}

/// Failure of a single attempt. Classified to decide whether to retry.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("API returned empty output")]
    EmptyContent,

    #[error("unreadable API response: {0}")]
    Envelope(String),
}

impl From<reqwest::Error> for AttemptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AttemptError::Timeout
        } else {
            AttemptError::Network(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Settings and request
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for the outbound generation call.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
    pub max_attempts: u32,
    /// Curve for 429 responses.
    pub rate_limit_backoff: Backoff,
    /// Curve for 5xx, network, timeout, empty and unrecognized failures.
    pub server_backoff: Backoff,
    pub schema_name: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.8,
            max_output_tokens: 1000,
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            rate_limit_backoff: Backoff::new(Duration::from_secs(1), 2.0, Duration::from_secs(10)),
            server_backoff: Backoff::new(Duration::from_millis(500), 1.5, Duration::from_secs(5)),
            schema_name: OUTPUT_SCHEMA_NAME.to_string(),
        }
    }
}

/// A fully rendered generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fixed system instructions.
    pub instructions: String,
    /// Prompt body with the product and platform details.
    pub input: String,
    /// JSON schema the output must conform to.
    pub output_schema: Value,
}

/// Anything that can turn a rendered prompt into raw structured text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (OpenAI Responses API)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    temperature: f32,
    max_output_tokens: u32,
    text: TextConfig<'a>,
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
    format: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ResponsesResponse {
    /// Concatenates every `output_text` block, like the SDKs' `output_text` helper.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|block| block.block_type == "output_text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI-backed generator. Constructed once in `main` and shared via `AppState`.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    settings: GenerationSettings,
}

impl OpenAiClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        settings: GenerationSettings,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    fn classify(&self, error: &AttemptError) -> RetryDecision {
        match error {
            AttemptError::Api { status, .. } => match *status {
                401 | 403 => RetryDecision::Fatal,
                429 => RetryDecision::Retry(self.settings.rate_limit_backoff),
                s if (500..600).contains(&s) => RetryDecision::Retry(self.settings.server_backoff),
                s if (400..500).contains(&s) => RetryDecision::Fatal,
                _ => RetryDecision::Retry(self.settings.server_backoff),
            },
            AttemptError::Timeout
            | AttemptError::Network(_)
            | AttemptError::EmptyContent
            | AttemptError::Envelope(_) => RetryDecision::Retry(self.settings.server_backoff),
        }
    }

    /// One HTTP round trip. Returns the model's output text.
    async fn attempt(&self, api_key: &str, body: &ResponsesRequest<'_>) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!("Generation API returned {status}: {message}");
            return Err(AttemptError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ResponsesResponse =
            serde_json::from_str(&text).map_err(|e| AttemptError::Envelope(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Generation call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        let output = parsed.output_text();
        if output.trim().is_empty() {
            return Err(AttemptError::EmptyContent);
        }
        Ok(output)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Auth("OPENAI_API_KEY is not set".to_string()))?;

        let body = ResponsesRequest {
            model: &self.settings.model,
            instructions: &request.instructions,
            input: &request.input,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
            text: TextConfig {
                format: JsonSchemaFormat {
                    format_type: "json_schema",
                    name: &self.settings.schema_name,
                    schema: &request.output_schema,
                    strict: true,
                },
            },
        };

        retry_with_backoff(
            "generation",
            self.settings.max_attempts,
            |e| self.classify(e),
            |_| self.attempt(api_key, &body),
        )
        .await
        .map_err(into_generation_error)
    }
}

/// Collapses the retry outcome into the error surfaced to callers.
fn into_generation_error(failure: RetryFailure<AttemptError>) -> GenerationError {
    match failure {
        RetryFailure::Fatal(AttemptError::Api {
            status: 401 | 403,
            message,
        }) => GenerationError::Auth(message),
        RetryFailure::Fatal(AttemptError::Api { status, message }) => {
            GenerationError::InvalidRequest { status, message }
        }
        RetryFailure::Fatal(other) => GenerationError::Failed {
            attempts: 1,
            message: other.to_string(),
        },
        RetryFailure::Exhausted { attempts, last } => match last {
            AttemptError::Api { status: 429, .. } => GenerationError::RateLimited { attempts },
            AttemptError::Api { status, message } if status >= 500 => {
                GenerationError::ServiceUnavailable { attempts, message }
            }
            e @ (AttemptError::Timeout | AttemptError::Network(_)) => {
                GenerationError::ServiceUnavailable {
                    attempts,
                    message: e.to_string(),
                }
            }
            other => GenerationError::Failed {
                attempts,
                message: other.to_string(),
            },
        },
    }
}
