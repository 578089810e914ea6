//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{Router, body::Body};

use digibot::api::AppState;
use digibot::api::app;
use digibot::core::{AppConfig, DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};
use digibot::search::{ContextIndex, Embedder};

pub const OPENING_HOURS: &str = "Branches open from 9am to 5pm on weekdays.";
pub const PARKING: &str = "Parking is free behind the main branch.";
pub const REFUNDS: &str = "A refund takes five working days to arrive.";

/// Three paragraphs that each land in their own chunk at the test
/// chunk size
pub fn test_context() -> String {
    [OPENING_HOURS, PARKING, REFUNDS].join("\n\n")
}

/// Embeds text as one dimension per topic word so tests don't need to
/// download a model
pub struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                ["open", "parking", "refund"]
                    .iter()
                    .map(|w| if t.contains(w) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

/// Config pointing both the chat endpoint and the completion API at
/// `base_url`, which is usually a `mockito` server.
pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        api_base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        greeting: String::from(DEFAULT_GREETING),
        error_message: String::from(DEFAULT_ERROR_MESSAGE),
        openai_model: String::from("gpt-4o"),
        openai_api_hostname: base_url.to_string(),
        openai_api_key: String::from("test-api-key"),
        context_path: None,
        chunk_size: 50,
        chunk_overlap: 0,
        top_k: 1,
    }
}

/// Creates a test application router whose completion calls go to
/// `llm_url`.
pub fn test_app(llm_url: &str) -> Router {
    let config = test_config(llm_url);
    let index = ContextIndex::build(
        &test_context(),
        Arc::new(KeywordEmbedder),
        config.chunk_size,
        config.chunk_overlap,
    )
    .expect("Failed to build context index");
    app(Arc::new(RwLock::new(AppState::new(config, index))))
}

/// Serve the test application on a random local port and return its
/// base URL.
pub async fn spawn_test_server(llm_url: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();
    let app = test_app(llm_url);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Body of an OpenAI compatible completion response
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf8")
}
