use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use postgen::config::Config;
use postgen::llm_client::OpenAiClient;
use postgen::routes::build_router;
use postgen::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting postgen v{}", env!("CARGO_PKG_VERSION"));

    // The one generator handle for the process, shared by every request
    let llm = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.generation.clone(),
    )?;
    if !llm.has_credentials() {
        warn!("OPENAI_API_KEY not found in environment; generation requests will fail");
    }
    info!(
        "Generation client initialized (model: {}, attempts: {}, timeout: {:?})",
        llm.settings().model,
        llm.settings().max_attempts,
        llm.settings().request_timeout
    );

    let state = AppState::new(Arc::new(llm));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
