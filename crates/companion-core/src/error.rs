use thiserror::Error;

/// Shown whenever no more specific message can be recovered from a failure
pub const GENERIC_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Separates the human-readable prefix of a decode error from the raw body excerpt
pub const RESPONSE_MARKER: &str = "Response:";

/// Everything that can go wrong during one round trip with the server.
///
/// None of these are fatal: the controller turns each of them into a bot
/// message and returns to idle.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The body was not valid JSON (declared or sniffed), or not the expected shape
    #[error("{message}")]
    Decode { message: String, raw: String },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-success status carrying a JSON body
    #[error("Server returned {status}")]
    ServerReported {
        status: u16,
        message: Option<String>,
        raw: String,
    },
}

impl ChatError {
    /// Raw response body, when there was one
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ChatError::Decode { raw, .. } | ChatError::ServerReported { raw, .. } => Some(raw),
            ChatError::Transport(_) => None,
        }
    }

    /// The text rendered to the user for this failure.
    ///
    /// Falls back to [`GENERIC_APOLOGY`] unless a server-written `message`
    /// field can be recovered, either directly from a reported error or from
    /// the excerpt embedded after [`RESPONSE_MARKER`].
    pub fn display_message(&self) -> String {
        match self {
            ChatError::ServerReported {
                message: Some(message),
                ..
            } => message.clone(),
            ChatError::Decode { message, .. } => {
                message_after_marker(message).unwrap_or_else(|| GENERIC_APOLOGY.to_string())
            }
            _ => GENERIC_APOLOGY.to_string(),
        }
    }
}

fn message_after_marker(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(RESPONSE_MARKER)?;
    match serde_json::from_str::<serde_json::Value>(rest.trim()) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        Err(e) => {
            tracing::debug!("Error parsing error response: {}", e);
            None
        }
    }
}
