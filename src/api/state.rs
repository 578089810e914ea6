use std::sync::Arc;

use crate::core::AppConfig;
use crate::search::ContextIndex;

pub struct AppState {
    pub config: AppConfig,
    // Built once at startup since the context doesn't change
    pub index: Arc<ContextIndex>,
}

impl AppState {
    pub fn new(config: AppConfig, index: ContextIndex) -> Self {
        Self {
            config,
            index: Arc::new(index),
        }
    }
}
