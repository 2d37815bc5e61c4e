//! The send pipeline and session reset.
//!
//! A round trip is split in two halves so that front ends can run the network
//! call wherever they like: `begin_*` mutates state synchronously and returns a
//! ticket, `complete_*` consumes the ticket together with the decoded result.
//! Tickets are not `Clone`, so each one releases the typing placeholder once.

use serde_json::Value;

use crate::client::ChatBackend;
use crate::decoder::DecodedResult;
use crate::error::ChatError;
use crate::render::MessageRenderer;
use crate::state::{ChatRole, EntryId, Mood, Reaction, UiState};

pub const GREETING: &str =
    "Hello! I'm Mind Companion, your mental health support chatbot. How are you feeling today?";

pub const RESETTING_NOTICE: &str = "Resetting conversation...";

/// An outstanding chat request
#[derive(Debug)]
#[must_use = "a pending send must be completed to release the typing placeholder"]
pub struct PendingSend {
    text: String,
    epoch: u64,
}

impl PendingSend {
    /// Trimmed text to send to the server
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// An outstanding reset request
#[derive(Debug)]
#[must_use]
pub struct PendingReset {
    _private: (),
}

pub struct ConversationController {
    ui: UiState,
    renderer: MessageRenderer,
    input: String,
    // Bumped by every successful reset; replies issued before it are dropped
    epoch: u64,
}

impl Default for ConversationController {
    fn default() -> Self {
        Self::new(MessageRenderer::default())
    }
}

impl ConversationController {
    /// A fresh conversation showing the greeting
    pub fn new(renderer: MessageRenderer) -> Self {
        let mut controller = Self {
            ui: UiState::default(),
            renderer,
            input: String::new(),
            epoch: 0,
        };
        controller.append(ChatRole::Bot, GREETING);
        controller
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn append(&mut self, role: ChatRole, text: &str) -> EntryId {
        let rendered = self.renderer.render(role, text);
        let id = self.ui.timeline.push(rendered);
        self.ui.request_scroll();
        id
    }

    /// Send whatever is in the input field
    pub fn submit_input(&mut self) -> Option<PendingSend> {
        let text = self.input.clone();
        self.begin_send(&text)
    }

    /// Render the user's message and show the typing placeholder.
    ///
    /// Returns `None` without touching any state when `text` is blank.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.append(ChatRole::User, text);
        self.input.clear();
        self.ui.timeline.hold_typing();

        tracing::debug!(epoch = self.epoch, "Sending message ({} chars)", text.chars().count());

        Some(PendingSend {
            text: text.to_string(),
            epoch: self.epoch,
        })
    }

    /// Apply the outcome of a send started by [`begin_send`](Self::begin_send)
    pub fn complete_send(&mut self, pending: PendingSend, result: DecodedResult) {
        if pending.epoch != self.epoch {
            tracing::debug!(
                issued = pending.epoch,
                current = self.epoch,
                "Dropping reply that arrived after a reset"
            );
            return;
        }

        self.ui.timeline.release_typing();

        match result {
            Ok(reply) => {
                self.ui.notice = None;
                self.append(ChatRole::Bot, &reply.message);
                if let Some(resources) = &reply.resources {
                    self.ui.panels.show_resources(resources);
                }
                if let Some(exercise) = &reply.exercise {
                    self.ui.panels.show_exercise(exercise);
                }
                if let Some(level) = reply.concern_level {
                    self.ui.concern_level = Some(level);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, raw = e.raw_body().unwrap_or(""), "Chat request failed");
                let message = e.display_message();
                self.append(ChatRole::Bot, &message);
            }
        }
    }

    /// Full round trip against `backend`. Returns false for blank input.
    pub async fn send<B>(&mut self, backend: &B, text: &str) -> bool
    where
        B: ChatBackend + ?Sized,
    {
        let Some(pending) = self.begin_send(text) else {
            return false;
        };
        let result = backend.send_message(pending.text()).await;
        self.complete_send(pending, result);
        true
    }

    /// Hide the mood selector and send the mood as a message
    pub fn select_mood(&mut self, mood: Mood) -> Option<PendingSend> {
        self.ui.mood.selected = Some(mood);
        self.ui.mood.visible = false;
        self.begin_send(&mood.message())
    }

    /// Put a chip's text into the input and send it
    pub fn activate_suggestion(&mut self, suggestion: &str) -> Option<PendingSend> {
        self.input = suggestion.to_string();
        self.submit_input()
    }

    /// Apply a reaction control on a bot entry.
    ///
    /// Acknowledgments are recorded locally; only
    /// [`Reaction::TryAnother`] produces a request.
    pub fn react(&mut self, id: EntryId, reaction: Reaction) -> Option<PendingSend> {
        let is_bot = self
            .ui
            .timeline
            .get(id)
            .map(|e| e.rendered.message.role == ChatRole::Bot)
            .unwrap_or(false);
        if !is_bot {
            return None;
        }

        match reaction.prompt() {
            Some(prompt) => self.begin_send(prompt),
            None => {
                self.ui.acknowledge(id, reaction);
                None
            }
        }
    }

    pub fn close_resources(&mut self) {
        self.ui.panels.close_resources();
    }

    pub fn close_exercise(&mut self) {
        self.ui.panels.close_exercise();
    }

    pub fn begin_reset(&mut self) -> PendingReset {
        self.ui.notice = Some(RESETTING_NOTICE.to_string());
        PendingReset { _private: () }
    }

    /// On success, wipe timeline, panels and mood in one step and greet again.
    /// On failure, state is left as is.
    pub fn complete_reset(&mut self, _pending: PendingReset, result: Result<Value, ChatError>) {
        match result {
            Ok(_) => {
                self.ui.clear();
                self.epoch += 1;
                self.append(ChatRole::Bot, GREETING);
                tracing::info!(epoch = self.epoch, "Conversation reset");
            }
            Err(e) => {
                tracing::error!(error = %e, raw = e.raw_body().unwrap_or(""), "Reset failed");
            }
        }
    }

    pub async fn reset<B>(&mut self, backend: &B)
    where
        B: ChatBackend + ?Sized,
    {
        let pending = self.begin_reset();
        let result = backend.reset().await;
        self.complete_reset(pending, result);
    }
}
