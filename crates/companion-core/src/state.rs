//! UI-agnostic conversation state
//!
//! This module contains data structures that are shared between front ends
//! and don't depend on any specific UI framework: the timeline, the typing
//! placeholder, mood selection and other transient display state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::panels::Panels;
use crate::payload::ConcernLevel;
use crate::render::RenderedMessage;

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// Fixed controls attached to every bot message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    ThankYou,
    Helpful,
    TryAnother,
}

/// Prompt resubmitted by [`Reaction::TryAnother`]
pub const TRY_ANOTHER_PROMPT: &str = "Can you give me another perspective on this?";

impl Reaction {
    pub const ALL: [Reaction; 3] = [Reaction::ThankYou, Reaction::Helpful, Reaction::TryAnother];

    pub fn icon(&self) -> &'static str {
        match self {
            Reaction::ThankYou => "❤",
            Reaction::Helpful => "👍",
            Reaction::TryAnother => "🔄",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reaction::ThankYou => "Thank you",
            Reaction::Helpful => "Helpful",
            Reaction::TryAnother => "Try another response",
        }
    }

    /// Text sent to the server when activated, if any
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Reaction::TryAnother => Some(TRY_ANOTHER_PROMPT),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Calm,
    Sad,
    Anxious,
    Stressed,
    Tired,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Sad,
        Mood::Anxious,
        Mood::Stressed,
        Mood::Tired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Stressed => "stressed",
            Mood::Tired => "tired",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Calm => "😌",
            Mood::Sad => "😢",
            Mood::Anxious => "😰",
            Mood::Stressed => "😫",
            Mood::Tired => "😴",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Message sent on the user's behalf when this mood is picked
    pub fn message(&self) -> String {
        format!("I'm feeling {} today", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub id: EntryId,
    pub rendered: RenderedMessage,
}

/// Append-only list of rendered messages, plus the typing placeholder.
///
/// The placeholder is drawn once however many sends are outstanding; each
/// send takes one hold on it and releases it exactly once.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    next_id: u64,
    typing_holds: usize,
}

impl Timeline {
    pub fn push(&mut self, rendered: RenderedMessage) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(TimelineEntry { id, rendered });
        id
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    /// Most recent bot entry, whose chips and reactions are the live ones
    pub fn last_bot(&self) -> Option<&TimelineEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.rendered.message.role == ChatRole::Bot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn typing_visible(&self) -> bool {
        self.typing_holds > 0
    }

    pub(crate) fn hold_typing(&mut self) {
        self.typing_holds += 1;
    }

    pub(crate) fn release_typing(&mut self) {
        self.typing_holds = self.typing_holds.saturating_sub(1);
    }

    /// Drop every entry and the placeholder. Ids keep increasing.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.typing_holds = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodSelector {
    pub visible: bool,
    pub selected: Option<Mood>,
}

impl Default for MoodSelector {
    fn default() -> Self {
        Self {
            visible: true,
            selected: None,
        }
    }
}

/// Everything the front end draws. Never persisted.
#[derive(Debug, Default)]
pub struct UiState {
    pub timeline: Timeline,
    pub panels: Panels,
    pub mood: MoodSelector,
    pub concern_level: Option<ConcernLevel>,
    /// Transient status line, e.g. while a reset is in flight
    pub notice: Option<String>,
    acknowledged: HashSet<(EntryId, Reaction)>,
    scroll_requested: bool,
}

impl UiState {
    pub fn is_acknowledged(&self, id: EntryId, reaction: Reaction) -> bool {
        self.acknowledged.contains(&(id, reaction))
    }

    pub(crate) fn acknowledge(&mut self, id: EntryId, reaction: Reaction) {
        self.acknowledged.insert((id, reaction));
    }

    pub(crate) fn request_scroll(&mut self) {
        self.scroll_requested = true;
    }

    /// True once after anything was appended; the front end scrolls to the end
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    pub(crate) fn clear(&mut self) {
        self.timeline.clear();
        self.panels.hide_all();
        self.mood = MoodSelector::default();
        self.concern_level = None;
        self.notice = None;
        self.acknowledged.clear();
    }
}
