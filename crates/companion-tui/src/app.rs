use ratatui::layout::Rect;
use companion_core::{
    ChatBackend, CompanionClient, Config, ConversationController, EntryId, Mood, PendingSend,
    Reaction,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Actions,
    Moods,
}

/// One activatable control under the latest bot message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Suggestion(String),
    Reaction(EntryId, Reaction),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub controller: ConversationController,
    pub client: CompanionClient,

    // Input state
    pub input_cursor: usize, // cursor position in the controller's input, in chars

    // Selection state
    pub action_idx: usize,
    pub mood_idx: usize,

    // Timeline scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub follow_latest: bool,
    pub panel_scroll: u16,

    // Animation state
    pub tick: u64,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Theme
    pub dark_mode: bool,
    pub persist_theme: bool,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub panel_area: Option<Rect>,
}

impl App {
    pub fn new(client: CompanionClient, dark_mode: bool, persist_theme: bool) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Input,
            controller: ConversationController::default(),
            client,

            input_cursor: 0,

            action_idx: 0,
            mood_idx: 0,

            chat_scroll: 0,
            chat_height: 0,
            follow_latest: true,
            panel_scroll: 0,

            tick: 0,
            animation_frame: 0,

            dark_mode,
            persist_theme,

            chat_area: None,
            panel_area: None,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.controller.ui().timeline.typing_visible() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Suggestion chips, then reactions, of the latest bot message
    pub fn actions(&self) -> Vec<Action> {
        let Some(entry) = self.controller.ui().timeline.last_bot() else {
            return Vec::new();
        };

        let chips = entry
            .rendered
            .suggestions
            .iter()
            .cloned()
            .map(Action::Suggestion);
        let reactions = entry
            .rendered
            .reactions
            .iter()
            .map(|r| Action::Reaction(entry.id, *r));

        chips.chain(reactions).collect()
    }

    pub fn selected_action(&self) -> Option<Action> {
        self.actions().into_iter().nth(self.action_idx)
    }

    pub fn actions_next(&mut self) {
        let len = self.actions().len();
        if len > 0 {
            self.action_idx = (self.action_idx + 1).min(len - 1);
        }
    }

    pub fn actions_prev(&mut self) {
        self.action_idx = self.action_idx.saturating_sub(1);
    }

    pub fn mood_next(&mut self) {
        self.mood_idx = (self.mood_idx + 1).min(Mood::ALL.len() - 1);
    }

    pub fn mood_prev(&mut self) {
        self.mood_idx = self.mood_idx.saturating_sub(1);
    }

    /// Move focus to the next pane that is currently shown
    pub fn cycle_focus(&mut self) {
        let moods_visible = self.controller.ui().mood.visible;
        self.focus = match self.focus {
            FocusPane::Input => FocusPane::Actions,
            FocusPane::Actions if moods_visible => FocusPane::Moods,
            FocusPane::Actions | FocusPane::Moods => FocusPane::Input,
        };
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_latest = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    /// Snap back to the newest message and keep following it
    pub fn scroll_to_bottom(&mut self) {
        self.follow_latest = true;
    }

    /// Issue the network half of a send on a background task
    pub fn dispatch(&mut self, pending: Option<PendingSend>, tx: &UnboundedSender<AppEvent>) {
        let Some(pending) = pending else {
            return;
        };

        // New content resets chip selection and input editing state
        self.action_idx = 0;
        self.input_cursor = 0;
        self.scroll_to_bottom();

        let client = self.client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.send_message(pending.text()).await;
            let _ = tx.send(AppEvent::Reply(pending, result));
        });
    }

    pub fn dispatch_reset(&mut self, tx: &UnboundedSender<AppEvent>) {
        let pending = self.controller.begin_reset();
        let client = self.client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.reset().await;
            let _ = tx.send(AppEvent::ResetDone(pending, result));
        });
    }

    /// Run the selected chip or reaction
    pub fn activate_selected(&mut self, tx: &UnboundedSender<AppEvent>) {
        let pending = match self.selected_action() {
            Some(Action::Suggestion(text)) => self.controller.activate_suggestion(&text),
            Some(Action::Reaction(id, reaction)) => self.controller.react(id, reaction),
            None => None,
        };
        self.dispatch(pending, tx);
    }

    pub fn select_mood(&mut self, mood: Mood, tx: &UnboundedSender<AppEvent>) {
        let pending = self.controller.select_mood(mood);
        self.focus = FocusPane::Input;
        self.dispatch(pending, tx);
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        if self.persist_theme {
            if let Err(e) = Config::save_dark_mode(self.dark_mode) {
                tracing::warn!("Could not save theme preference: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::ReplyPayload;

    fn app() -> App {
        App::new(CompanionClient::new("http://127.0.0.1:9"), true, false)
    }

    #[test]
    fn test_actions_for_greeting() {
        let app = app();
        let actions = app.actions();
        // Default chips plus three reactions
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[0], Action::Suggestion("Tell me more".to_string()));
        assert!(matches!(actions[5], Action::Reaction(_, Reaction::TryAnother)));
    }

    #[test]
    fn test_actions_follow_latest_bot_message() {
        let mut app = app();
        let pending = app.controller.begin_send("I can't sleep").unwrap();
        app.controller
            .complete_send(pending, Ok(ReplyPayload::text("Poor sleep often follows stress.")));
        let actions = app.actions();
        assert_eq!(actions[0], Action::Suggestion("How can I manage anxiety?".to_string()));
        assert_eq!(actions[2], Action::Suggestion("Sleep meditation".to_string()));
    }

    #[test]
    fn test_action_selection_is_clamped() {
        let mut app = app();
        for _ in 0..20 {
            app.actions_next();
        }
        assert_eq!(app.action_idx, app.actions().len() - 1);
        for _ in 0..20 {
            app.actions_prev();
        }
        assert_eq!(app.action_idx, 0);
    }

    #[test]
    fn test_focus_skips_hidden_moods() {
        let mut app = app();
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Actions);
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Moods);
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Input);

        app.controller.ui_mut().mood.visible = false;
        app.cycle_focus();
        app.cycle_focus();
        assert_eq!(app.focus, FocusPane::Input);
    }

    #[test]
    fn test_acknowledge_stays_local() {
        let mut app = app();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        app.action_idx = 3; // "Thank you"
        app.activate_selected(&tx);
        let greeting = app.controller.ui().timeline.last().unwrap().id;
        assert!(app.controller.ui().is_acknowledged(greeting, Reaction::ThankYou));
        assert_eq!(app.controller.ui().timeline.len(), 1);
        assert!(rx.try_recv().is_err());
    }
}
