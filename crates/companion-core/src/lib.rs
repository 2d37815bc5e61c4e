pub mod client;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod markdown;
pub mod panels;
pub mod payload;
pub mod render;
pub mod state;
pub mod suggestions;

// Re-export main types for convenience
pub use client::{ChatBackend, CompanionClient};
pub use config::Config;
pub use controller::{ConversationController, PendingReset, PendingSend, GREETING};
pub use decoder::{decode, decode_value, DecodedResult, RawResponse};
pub use error::{ChatError, GENERIC_APOLOGY};
pub use markdown::{CommonMark, Fragment, MarkdownRenderer};
pub use panels::{ExercisePanel, Panels, ResourcesPanel};
pub use payload::{ConcernLevel, ExerciseBlock, ReplyPayload, ResourceBlock, ResourceItem};
pub use render::{MessageRenderer, RenderedMessage};
pub use state::{ChatMessage, ChatRole, EntryId, Mood, Reaction, UiState};
