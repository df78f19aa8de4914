//! Otto Studio REST API server
//!
//! Hosts one workflow session and serves the compiled browser UI.

mod api;

use anyhow::{Context, Result};
use llm_bridge::GeminiClient;
use std::path::PathBuf;
use std::sync::Arc;
use studio_core::WorkflowController;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "crates/yew_frontend/dist";

struct ServerConfig {
    addr: String,
    static_dir: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            addr: get("OTTO_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            static_dir: get("OTTO_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    let client = GeminiClient::from_env()?;
    tracing::info!(
        "Using Gemini models {} (ideas) and {} (images)",
        client.config().text_model,
        client.config().image_model
    );
    let controller = Arc::new(WorkflowController::new(Arc::new(client)));

    if !config.static_dir.is_dir() {
        tracing::warn!(
            "Static directory {} not found; only the API will be served",
            config.static_dir.display()
        );
    }

    let app = api::router(api::AppState::new(controller))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    tracing::info!("Server listening on {}", config.addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
