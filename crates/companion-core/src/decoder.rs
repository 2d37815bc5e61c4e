//! Turns raw HTTP responses into replies or typed failures.
//!
//! Servers in the wild mislabel their content type, so a body that is not
//! declared as JSON is still sniffed for JSON before giving up.

use serde_json::Value;

use crate::error::{ChatError, RESPONSE_MARKER};
use crate::payload::ReplyPayload;

/// Longest body excerpt embedded in a decode error, in characters
pub const EXCERPT_LIMIT: usize = 100;

pub type DecodedResult = Result<ReplyPayload, ChatError>;

/// The parts of an HTTP response the decoder looks at
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn declares_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Decode a chat endpoint response into a [`ReplyPayload`]
pub fn decode(response: &RawResponse) -> DecodedResult {
    let value = decode_value(response)?;
    serde_json::from_value(value).map_err(|e| ChatError::Decode {
        message: format!("Unexpected reply shape: {}", e),
        raw: response.body.clone(),
    })
}

/// Decode any JSON body, without requiring a particular shape
pub fn decode_value(response: &RawResponse) -> Result<Value, ChatError> {
    let value = if response.declares_json() {
        serde_json::from_str::<Value>(&response.body).map_err(|e| ChatError::Decode {
            message: format!("Failed to parse JSON response: {}", e),
            raw: response.body.clone(),
        })?
    } else {
        tracing::warn!(
            content_type = response.content_type.as_deref().unwrap_or("<none>"),
            "Server returned non-JSON response: {}",
            response.body
        );
        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => value,
            Err(_) => {
                return Err(ChatError::Decode {
                    message: format!(
                        "Server did not return valid JSON. {} {}",
                        RESPONSE_MARKER,
                        excerpt(&response.body)
                    ),
                    raw: response.body.clone(),
                });
            }
        }
    };

    if !response.is_success() {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        return Err(ChatError::ServerReported {
            status: response.status,
            message,
            raw: response.body.clone(),
        });
    }

    Ok(value)
}

/// First [`EXCERPT_LIMIT`] characters of `body`, with `...` appended when cut
pub fn excerpt(body: &str) -> String {
    if body.chars().count() > EXCERPT_LIMIT {
        let mut cut: String = body.chars().take(EXCERPT_LIMIT).collect();
        cut.push_str("...");
        cut
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_APOLOGY;

    #[test]
    fn test_declared_json() {
        let response = RawResponse::new(200, Some("application/json"), r#"{"message":"hi"}"#);
        let reply = decode(&response).unwrap();
        assert_eq!(reply, ReplyPayload::text("hi"));
    }

    #[test]
    fn test_declared_json_with_charset() {
        let response = RawResponse::new(
            200,
            Some("application/json; charset=utf-8"),
            r#"{"message":"hi"}"#,
        );
        assert!(response.declares_json());
        assert_eq!(decode(&response).unwrap().message, "hi");
    }

    #[test]
    fn test_mislabeled_json_is_sniffed() {
        let response = RawResponse::new(200, Some("text/plain"), r#"{"message":"hi"}"#);
        assert_eq!(decode(&response).unwrap(), ReplyPayload::text("hi"));
    }

    #[test]
    fn test_missing_content_type_is_sniffed() {
        let response = RawResponse::new(200, None, r#"{"message":"hi"}"#);
        assert_eq!(decode(&response).unwrap().message, "hi");
    }

    #[test]
    fn test_not_json_at_all() {
        for ct in [Some("text/html"), Some("text/plain"), None] {
            let response = RawResponse::new(200, ct, "not json at all");
            match decode(&response) {
                Err(ChatError::Decode { message, raw }) => {
                    assert_eq!(
                        message,
                        "Server did not return valid JSON. Response: not json at all"
                    );
                    assert_eq!(raw, "not json at all");
                }
                other => panic!("expected decode error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_long_body_excerpt_truncated() {
        let body = "x".repeat(150);
        let response = RawResponse::new(502, Some("text/html"), body.clone());
        let err = decode(&response).unwrap_err();
        let message = err.to_string();
        let (_, tail) = message.split_once(RESPONSE_MARKER).unwrap();
        assert_eq!(tail.trim(), format!("{}...", "x".repeat(100)));
        assert_eq!(err.raw_body(), Some(body.as_str()));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let body = "é".repeat(100);
        assert_eq!(excerpt(&body), body);
        let longer = "é".repeat(101);
        assert_eq!(excerpt(&longer), format!("{}...", body));
    }

    #[test]
    fn test_mislabeled_error_body_is_reported() {
        // Declared HTML, valid JSON body: sniffed successfully, then classified by status
        let response = RawResponse::new(
            500,
            Some("text/html"),
            r#"{"error":"Processing error","message":"Please try again later."}"#,
        );
        let err = decode(&response).unwrap_err();
        assert_eq!(err.display_message(), "Please try again later.");
    }

    #[test]
    fn test_declared_json_parse_failure() {
        let response = RawResponse::new(200, Some("application/json"), "{\"message\":");
        let err = decode(&response).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse JSON response"));
        assert_eq!(err.display_message(), GENERIC_APOLOGY);
    }

    #[test]
    fn test_server_reported_error() {
        let response = RawResponse::new(
            500,
            Some("application/json"),
            r#"{"error":"boom","message":"I'm sorry, I encountered an error processing your message. Please try again.","resources":null,"exercise":null}"#,
        );
        match decode(&response) {
            Err(ChatError::ServerReported { status, message, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(
                    message.as_deref(),
                    Some("I'm sorry, I encountered an error processing your message. Please try again.")
                );
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape() {
        let response = RawResponse::new(200, Some("application/json"), r#"{"success":true}"#);
        let err = decode(&response).unwrap_err();
        assert!(matches!(err, ChatError::Decode { .. }));
        assert!(err.to_string().starts_with("Unexpected reply shape"));
    }

    #[test]
    fn test_decode_value_accepts_any_object() {
        let response = RawResponse::new(
            200,
            Some("application/json"),
            r#"{"message":"Conversation reset successfully","success":true}"#,
        );
        let value = decode_value(&response).unwrap();
        assert_eq!(value["success"], Value::Bool(true));
    }
}
