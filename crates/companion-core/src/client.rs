use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::decoder::{self, DecodedResult, RawResponse};
use crate::error::ChatError;
use crate::payload::ChatRequest;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// The two server operations the client consumes
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, message: &str) -> DecodedResult;

    async fn reset(&self) -> Result<Value, ChatError>;
}

#[derive(Clone)]
pub struct CompanionClient {
    client: Client,
    base_url: String,
}

impl CompanionClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Self {
        // The server keys conversation history off its session cookie
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read(response: reqwest::Response) -> Result<RawResponse, ChatError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        tracing::debug!(status, content_type = ?content_type, bytes = body.len(), "Response received");

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl ChatBackend for CompanionClient {
    async fn send_message(&self, message: &str) -> DecodedResult {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&ChatRequest { message })
            .send()
            .await?;

        let raw = Self::read(response).await?;
        decoder::decode(&raw)
    }

    async fn reset(&self) -> Result<Value, ChatError> {
        let url = format!("{}/api/reset", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let raw = Self::read(response).await?;
        decoder::decode_value(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request it answered
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let (url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"status":"success","message":"I'm here for you.","exercise":{"name":"Box Breathing","description":"Inhale 4, hold 4","benefits":"Reduces stress"},"resources":null,"concern_level":"moderate"}"#,
        )
        .await;

        let client = CompanionClient::new(&url);
        let reply = client.send_message("I feel anxious").await.unwrap();
        assert_eq!(reply.message, "I'm here for you.");
        assert_eq!(reply.exercise.unwrap().name, "Box Breathing");
        assert!(reply.resources.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/chat"));
        assert!(request.contains(r#"{"message":"I feel anxious"}"#));
    }

    #[tokio::test]
    async fn test_send_message_mislabeled_html() {
        let (url, _server) = serve_once("502 Bad Gateway", "text/html", "<html>Bad Gateway</html>").await;

        let client = CompanionClient::new(&url);
        let err = client.send_message("hello").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server did not return valid JSON. Response: <html>Bad Gateway</html>"
        );
    }

    #[tokio::test]
    async fn test_reset_accepts_any_json() {
        let (url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"message":"Conversation reset successfully","success":true}"#,
        )
        .await;

        let client = CompanionClient::new(&url);
        let value = client.reset().await.unwrap();
        assert_eq!(value["success"], Value::Bool(true));
        assert!(server.await.unwrap().starts_with("POST /api/reset"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = CompanionClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) is closed on test machines
        let client = CompanionClient::with_timeout("http://127.0.0.1:9", Some(Duration::from_secs(2)));
        let err = client.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert_eq!(err.display_message(), crate::error::GENERIC_APOLOGY);
    }
}
