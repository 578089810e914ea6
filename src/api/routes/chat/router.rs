//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use super::public;
use crate::ai::prompt::{self, Prompt};
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::openai::chat;

type SharedState = Arc<RwLock<AppState>>;

/// Answer a single query using the context chunks closest to it. Each
/// request is independent, no conversation history is kept between
/// calls.
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<impl IntoResponse, crate::api::public::ApiError> {
    let query = payload.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(public::ChatErrorResponse::new("No query provided")),
        )
            .into_response());
    }

    let (index, top_k, openai_api_hostname, openai_api_key, openai_model) = {
        let shared_state = state.read().expect("Unable to read share state");
        let AppConfig {
            openai_api_hostname,
            openai_api_key,
            openai_model,
            top_k,
            ..
        } = &shared_state.config;
        (
            Arc::clone(&shared_state.index),
            *top_k,
            openai_api_hostname.clone(),
            openai_api_key.clone(),
            openai_model.clone(),
        )
    };

    // Embedding the query is CPU bound
    let matched = tokio::task::spawn_blocking({
        let query = query.to_string();
        move || index.search(&query, top_k)
    })
    .await??;
    tracing::debug!("Matched {} context chunks", matched.len());

    let system_message = prompt::templates().render(
        &Prompt::ChatSystem.to_string(),
        &json!({"context": matched.join(" ")}),
    )?;

    let msg = chat(
        &system_message,
        query,
        &openai_api_hostname,
        &openai_api_key,
        &openai_model,
    )
    .await?;

    Ok(axum::Json(public::ChatResponse::new(&msg.content)).into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
