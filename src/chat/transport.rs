//! One request/response exchange with the remote chat endpoint

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{ChatQuery, ChatReply};

#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached or the call timed out
    #[error("network error: {0}")]
    Network(String),
    /// The endpoint replied with a non-success status
    #[error("server error: status {status}")]
    Server { status: u16 },
    /// The endpoint replied successfully but the body was not a
    /// `{"response": <string>}` object
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The transport call panicked before producing an outcome
    #[error("transport task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, query: &str) -> Result<ChatReply, TransportError>;
}

/// Sends queries to `<base-url>/chat` over HTTP. Makes exactly one
/// request per call with no retries.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(api_base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/chat", api_base_url.trim_end_matches("/")),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, query: &str) -> Result<ChatReply, TransportError> {
        let payload = ChatQuery {
            query: query.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Server {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        serde_json::from_str::<ChatReply>(&body).map_err(|e| TransportError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(url, Duration::from_secs(5))
    }

    #[test]
    fn it_builds_chat_url() {
        assert_eq!(transport("http://localhost:5009/").url(), "http://localhost:5009/chat");
        assert_eq!(transport("http://localhost:5009").url(), "http://localhost:5009/chat");
    }

    #[tokio::test]
    async fn it_decodes_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({"query": "hello"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "hi"}"#)
            .expect(1)
            .create_async()
            .await;

        let reply = transport(&server.url()).send("hello").await.unwrap();

        assert_eq!(reply.response, "hi");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_returns_server_error_on_bad_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let result = transport(&server.url()).send("hello").await;

        assert!(matches!(result, Err(TransportError::Server { status: 500 })));
        // No retries
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_returns_protocol_error_on_wrong_shape() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "hi"}"#)
            .create_async()
            .await;

        let result = transport(&server.url()).send("hello").await;

        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }

    #[tokio::test]
    async fn it_returns_protocol_error_on_non_string_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"response": 42}"#)
            .create_async()
            .await;

        let result = transport(&server.url()).send("hello").await;

        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }

    #[tokio::test]
    async fn it_returns_network_error_when_unreachable() {
        // Grab a free port then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport(&format!("http://{}", addr)).send("hello").await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }

    #[tokio::test]
    async fn it_returns_network_error_on_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept the connection and never answer
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = HttpTransport::new(&format!("http://{}", addr), Duration::from_millis(100))
            .send("hello")
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
