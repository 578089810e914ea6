use std::env;
use std::time::Duration;

pub const DEFAULT_GREETING: &str = "👋 Hi! How can I assist you today?";
pub const DEFAULT_ERROR_MESSAGE: &str =
    "Error: Chatbot is not responding. Please try again later.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub greeting: String,
    pub error_message: String,
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub context_path: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        let host = "127.0.0.1";
        let port = "5009";
        let api_base_url =
            env::var("DIGIBOT_API_BASE_URL").unwrap_or(format!("http://{}:{}", host, port));
        // Unparseable values fall back to the default rather than
        // failing startup
        let request_timeout = env::var("DIGIBOT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));
        let greeting =
            env::var("DIGIBOT_GREETING").unwrap_or_else(|_| DEFAULT_GREETING.to_string());
        let error_message = env::var("DIGIBOT_ERROR_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_ERROR_MESSAGE.to_string());
        let openai_api_hostname = env::var("DIGIBOT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("DIGIBOT_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let context_path = env::var("DIGIBOT_CONTEXT_PATH").ok();
        let chunk_size = env_usize("DIGIBOT_CHUNK_SIZE", 512);
        let chunk_overlap = env_usize("DIGIBOT_CHUNK_OVERLAP", 50);
        let top_k = env_usize("DIGIBOT_TOP_K", 3);

        Self {
            api_base_url,
            request_timeout,
            greeting,
            error_message,
            openai_model,
            openai_api_hostname,
            openai_api_key,
            context_path,
            chunk_size,
            chunk_overlap,
            top_k,
        }
    }
}

impl AppConfig {
    /// Override the chat endpoint's base URL, e.g. from a command
    /// line flag.
    pub fn with_api_base_url(mut self, api_base_url: Option<String>) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        self
    }
}
