//! Public types for the chat API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ChatRequest {
    // Optional so a missing or null query gets a 400 instead of a
    // deserialization rejection
    pub query: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: String,
}

impl ChatErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.into(),
        }
    }
}
