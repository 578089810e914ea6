//! API routes module

pub mod chat;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::{Router, routing::get};

type SharedState = Arc<RwLock<AppState>>;

async fn index() -> &'static str {
    "Welcome to the DigiBot chat API!"
}

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        // Chat routes
        .nest("/chat", chat::router())
}
