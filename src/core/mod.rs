mod config;
pub use config::{AppConfig, DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};
