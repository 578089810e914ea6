use std::fs;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::search::{ContextIndex, FastEmbedder};

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    // Browser pages on other origins call the chat endpoint directly
    let cors = CorsLayer::permissive();

    Router::new()
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(Arc::clone(&shared_state))
}

/// Reads the context given to the model with every query. Empty when
/// no context file is configured.
pub fn load_context(config: &AppConfig) -> Result<String> {
    match &config.context_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path)),
        None => Ok(String::new()),
    }
}

/// Chunks and embeds the context so each query only sees the parts
/// relevant to it. No embedding model is loaded when there is no
/// context.
pub fn load_index(config: &AppConfig) -> Result<ContextIndex> {
    let context = load_context(config)?;
    if context.trim().is_empty() {
        return Ok(ContextIndex::empty());
    }
    let embedder = FastEmbedder::new().context("Failed to load embedding model")?;
    ContextIndex::build(
        &context,
        Arc::new(embedder),
        config.chunk_size,
        config.chunk_overlap,
    )
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let index = tokio::task::spawn_blocking({
        let config = config.clone();
        move || load_index(&config)
    })
    .await??;
    tracing::info!("Loaded {} context chunks", index.len());
    let app_state = AppState::new(config, index);
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    tracing::debug!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
