//! Wire types for the companion server's chat endpoint.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Structured reply returned by the chat endpoint.
///
/// `resources` and `exercise` are independent: either, neither or both may be
/// present. The server sends explicit `null` for absent blocks, which serde
/// maps to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<ExerciseBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concern_level: Option<ConcernLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyPayload {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resources: None,
            exercise: None,
            status: None,
            concern_level: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBlock {
    pub message: String,
    #[serde(default)]
    pub resources: Vec<ResourceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helpline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBlock {
    pub name: String,
    pub description: String,
    pub benefits: String,
}

/// Server-side assessment attached to each successful reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcernLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl ConcernLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcernLevel::Low => "low",
            ConcernLevel::Moderate => "moderate",
            ConcernLevel::High => "high",
            ConcernLevel::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_null_blocks() {
        let json = r#"{"status":"success","message":"Hi there","exercise":null,"resources":null,"concern_level":"low"}"#;
        let reply: ReplyPayload = serde_json::from_str(json).unwrap();
        assert_eq!(reply.message, "Hi there");
        assert!(reply.resources.is_none());
        assert!(reply.exercise.is_none());
        assert_eq!(reply.concern_level, Some(ConcernLevel::Low));
    }

    #[test]
    fn test_resource_item_optional_fields() {
        let json = r#"{
            "message": "These resources might be helpful:",
            "resources": [
                {"name": "Calm", "description": "Sleep app", "website": "https://www.calm.com/"},
                {"name": "NAMI", "description": "Support", "helpline": "1-800-950-6264"}
            ]
        }"#;
        let block: ResourceBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.resources.len(), 2);
        assert_eq!(block.resources[0].website.as_deref(), Some("https://www.calm.com/"));
        assert!(block.resources[0].helpline.is_none());
        assert!(block.resources[1].contact.is_none());
        assert_eq!(block.resources[1].helpline.as_deref(), Some("1-800-950-6264"));
    }

    #[test]
    fn test_exercise_requires_all_fields() {
        let json = r#"{"name": "Box Breathing", "description": "Inhale for 4"}"#;
        assert!(serde_json::from_str::<ExerciseBlock>(json).is_err());
    }
}
