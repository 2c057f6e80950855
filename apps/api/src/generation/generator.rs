//! Generation pipeline — prompt, generate, parse for one validated request.

use tracing::info;

use crate::errors::AppError;
use crate::generation::parser::parse_posts;
use crate::generation::prompts::build_generation_request;
use crate::generation::validation::GenerateInput;
use crate::llm_client::TextGenerator;
use crate::models::post::GeneratedPost;

/// Runs the full pipeline. The generator is invoked at most once here; any retrying
/// happens inside the generator itself.
pub async fn generate_posts(
    generator: &dyn TextGenerator,
    input: &GenerateInput,
) -> Result<Vec<GeneratedPost>, AppError> {
    let request = build_generation_request(&input.product, &input.platforms)?;

    info!(
        "Generating posts for '{}' across {} platform(s)",
        input.product.name,
        input.platforms.len()
    );

    let raw = generator.generate(&request).await?;
    let posts = parse_posts(&raw, &input.platforms)?;

    info!("Generated {} post(s)", posts.len());
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::GenerationError;
    use crate::models::platform::Platform;
    use crate::models::product::{PlatformSelection, Product};
    use crate::llm_client::{GenerationSettings, OpenAiClient};
    use crate::test_support::{output_text_reply, MockBehavior, MockGenerator};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer};

    fn input(platforms: PlatformSelection) -> GenerateInput {
        GenerateInput {
            product: Product {
                name: "EcoBottle Pro".to_string(),
                description: "Reusable bottle with UV purification".to_string(),
                price: 49.99,
                category: Some("Health".to_string()),
            },
            platforms,
        }
    }

    #[tokio::test]
    async fn test_pipeline_returns_parsed_posts() {
        let generator =
            MockGenerator::replying(r#"{"array":[{"platform":"x","post":"🚀 Stay hydrated"}]}"#);
        let platforms = [(Platform::X, 1)].into_iter().collect();

        let posts = generate_posts(&generator, &input(platforms)).await.unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "🚀 Stay hydrated");
        let sent = generator.last_request().unwrap();
        assert!(sent.input.contains("EcoBottle Pro"));
        assert!(sent.instructions.contains("Twitter/X"));
    }

    #[tokio::test]
    async fn test_empty_selection_never_reaches_generator() {
        let generator = MockGenerator::replying("{}");

        let err = generate_posts(&generator, &input(PlatformSelection::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_output_is_parse_error_after_one_call() {
        let generator = MockGenerator::replying("Platform: x\nBuy it now!");
        let platforms = [(Platform::X, 1)].into_iter().collect();

        let err = generate_posts(&generator, &input(platforms)).await.unwrap_err();

        assert!(matches!(err, AppError::Generation(GenerationError::Parse(_))));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_generator_errors_propagate() {
        let generator = MockGenerator::new(MockBehavior::RateLimited);
        let platforms = [(Platform::Instagram, 2)].into_iter().collect();

        let err = generate_posts(&generator, &input(platforms)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Generation(GenerationError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_schema_violation_from_api_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(output_text_reply(r#"{"posts":"nope"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let client =
            OpenAiClient::new(Some("sk-test".to_string()), server.uri(), GenerationSettings::default())
                .unwrap();
        let platforms = [(Platform::X, 1)].into_iter().collect();

        let err = generate_posts(&client, &input(platforms)).await.unwrap_err();

        assert!(matches!(err, AppError::Generation(GenerationError::Parse(_))));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
