//! Turns a role and text into a timeline entry.

use std::sync::Arc;

use crate::markdown::{CommonMark, Fragment, MarkdownRenderer};
use crate::state::{ChatMessage, ChatRole, Reaction};
use crate::suggestions::suggestions_for;

/// One message as it will be drawn: the body plus bot-only controls
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub message: ChatMessage,
    pub body: Fragment,
    /// Empty for user messages
    pub reactions: Vec<Reaction>,
    /// Empty for user messages
    pub suggestions: Vec<String>,
}

#[derive(Clone)]
pub struct MessageRenderer {
    markdown: Arc<dyn MarkdownRenderer>,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(Arc::new(CommonMark::default()))
    }
}

impl MessageRenderer {
    pub fn new(markdown: Arc<dyn MarkdownRenderer>) -> Self {
        Self { markdown }
    }

    pub fn render(&self, role: ChatRole, text: &str) -> RenderedMessage {
        let message = ChatMessage {
            role,
            text: text.to_string(),
        };

        match role {
            // User input is never interpreted as markup
            ChatRole::User => RenderedMessage {
                message,
                body: Fragment::plain(text),
                reactions: Vec::new(),
                suggestions: Vec::new(),
            },
            ChatRole::Bot => RenderedMessage {
                message,
                body: self.markdown.render(text),
                reactions: Reaction::ALL.to_vec(),
                suggestions: suggestions_for(text),
            },
        }
    }
}
