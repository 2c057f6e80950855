use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::validation::ValidationErrors;
use crate::llm_client::GenerationError;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const UNAVAILABLE_MESSAGE: &str =
    "The generation service is temporarily unavailable. Please try again later.";
pub const AUTH_MESSAGE: &str = "Invalid API key. Please check your OpenAI API key.";
pub const GENERIC_MESSAGE: &str = "Failed to generate posts. Please try again later.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl AppError {
    /// Message shown to callers. Internal detail stays in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation failed",
            AppError::Generation(GenerationError::RateLimited { .. }) => RATE_LIMIT_MESSAGE,
            AppError::Generation(GenerationError::ServiceUnavailable { .. }) => UNAVAILABLE_MESSAGE,
            AppError::Generation(GenerationError::Auth(_)) => AUTH_MESSAGE,
            AppError::Generation(_) => GENERIC_MESSAGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(errors) => {
                tracing::info!("Rejected request: {errors}");
                let body = Json(json!({
                    "message": self.public_message(),
                    "code": "validation",
                    "details": errors.details,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                internal(self.public_message())
            }
        }
    }
}

fn internal(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_renders_422_with_details() {
        let mut errors = ValidationErrors::default();
        errors.push("product.name", "Product name is required");
        errors.push("platforms", "At least one platform must be selected");

        let (status, body) = render(AppError::Validation(errors)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation");
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["details"][0]["field"], "product.name");
    }

    #[tokio::test]
    async fn test_rate_limit_renders_try_again_later() {
        let (status, body) =
            render(AppError::Generation(GenerationError::RateLimited { attempts: 3 })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": RATE_LIMIT_MESSAGE }));
    }

    #[tokio::test]
    async fn test_parse_error_does_not_leak_detail() {
        let (status, body) = render(AppError::Generation(GenerationError::Parse(
            "expected value at line 1 column 1".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": GENERIC_MESSAGE }));
    }

    #[tokio::test]
    async fn test_unavailable_and_auth_messages() {
        let (_, body) = render(AppError::Generation(GenerationError::ServiceUnavailable {
            attempts: 3,
            message: "502 from upstream".to_string(),
        }))
        .await;
        assert_eq!(body["error"], UNAVAILABLE_MESSAGE);

        let (_, body) = render(AppError::Generation(GenerationError::Auth(
            "Incorrect API key provided: sk-abc".to_string(),
        )))
        .await;
        assert_eq!(body["error"], AUTH_MESSAGE);
    }
}
