//! Typed client for `POST /api/generate`.
//!
//! Validates the payload locally, then sends it with its own retry loop. That loop
//! is independent of the server's retries against the generator. Network failures
//! and 408/429/5xx responses are retried; every other 4xx is surfaced at once.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::generation::validation::{validate_request, FieldError, ValidationErrors};
use crate::models::post::{GenerateResponse, GeneratedPost};
use crate::models::product::PlatformSelection;
use crate::retry::{retry_with_backoff, Backoff, RetryDecision};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success status whose body is not a posts response.
    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Product fields as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Bound on the whole exchange, retries and backoff included.
    pub overall_timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(120),
            max_attempts: 3,
            backoff: Backoff::new(Duration::from_secs(1), 2.0, Duration::from_secs(8)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    details: Vec<FieldError>,
}

#[derive(Clone)]
pub struct PostsClient {
    http: Client,
    base_url: String,
    settings: ClientSettings,
}

impl PostsClient {
    pub fn new(base_url: impl Into<String>, settings: ClientSettings) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }

    /// Requests posts for `product` on the selected platforms.
    pub async fn generate(
        &self,
        product: &ProductDraft,
        platforms: &PlatformSelection,
    ) -> Result<Vec<GeneratedPost>, ClientError> {
        let body = json!({ "product": product, "platforms": platforms.to_wire() });
        validate_request(&body)?;

        let exchange = retry_with_backoff(
            "generate request",
            self.settings.max_attempts,
            |e| self.classify(e),
            |_| self.send(&body),
        );

        match tokio::time::timeout(self.settings.overall_timeout, exchange).await {
            Ok(result) => result
                .map(|response| response.posts)
                .map_err(|failure| failure.into_inner()),
            Err(_) => Err(ClientError::Timeout(self.settings.overall_timeout)),
        }
    }

    fn classify(&self, error: &ClientError) -> RetryDecision {
        match error {
            ClientError::Network(_) => RetryDecision::Retry(self.settings.backoff),
            ClientError::Api { status, .. } if is_retryable_status(*status) => {
                RetryDecision::Retry(self.settings.backoff)
            }
            ClientError::Api { .. }
            | ClientError::InvalidResponse(_)
            | ClientError::Validation(_)
            | ClientError::Timeout(_) => RetryDecision::Fatal,
        }
    }

    async fn send(&self, body: &serde_json::Value) -> Result<GenerateResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str::<GenerateResponse>(&text)
                .map_err(|e| ClientError::InvalidResponse(e.to_string()));
        }

        let parsed = serde_json::from_str::<ErrorBody>(&text).ok();

        if status.as_u16() == 422 {
            if let Some(body) = parsed.as_ref().filter(|b| !b.details.is_empty()) {
                return Err(ClientError::Validation(ValidationErrors {
                    details: body.details.clone(),
                }));
            }
        }

        let message = parsed
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(text);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..600).contains(&status)
}
