//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::generate_posts;
use crate::generation::validation::{validate_request, ValidationErrors};
use crate::models::post::GenerateResponse;
use crate::state::AppState;

/// POST /api/generate
///
/// Validates `{ product, platforms }`, then runs prompt → generate → parse.
/// Validation failures never reach the generator.
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let span = info_span!("generate", request_id = %Uuid::new_v4());

    async move {
        let Json(body) =
            body.map_err(|rejection| ValidationErrors::single("body", rejection.body_text()))?;

        let input = validate_request(&body)?;
        let posts = generate_posts(state.generator.as_ref(), &input).await?;

        Ok::<_, AppError>(Json(GenerateResponse { posts }))
    }
    .instrument(span)
    .await
}
