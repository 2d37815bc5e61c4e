use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use companion_core::Mood;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(pending, result) => {
            app.controller.complete_send(pending, result);
            app.action_idx = 0;
        }
        AppEvent::ResetDone(pending, result) => {
            app.controller.complete_reset(pending, result);
            app.action_idx = 0;
            app.mood_idx = 0;
            app.panel_scroll = 0;
            app.scroll_to_bottom();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any pane
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.dispatch_reset(tx);
            return;
        }
        KeyCode::Char('t') if ctrl => {
            app.toggle_dark_mode();
            return;
        }
        KeyCode::Char('o') if ctrl => {
            app.controller.close_resources();
            return;
        }
        KeyCode::Char('e') if ctrl => {
            app.controller.close_exercise();
            return;
        }
        KeyCode::Esc => {
            app.controller.close_resources();
            app.controller.close_exercise();
            app.focus = FocusPane::Input;
            return;
        }
        KeyCode::Tab => {
            app.cycle_focus();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(2) / 2);
            return;
        }
        KeyCode::End if ctrl => {
            app.scroll_to_bottom();
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Input => handle_input(app, key, tx),
        FocusPane::Actions => handle_actions(app, key, tx),
        FocusPane::Moods => handle_moods(app, key, tx),
    }
}

fn handle_input(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            insert_char(app, '\n');
        }
        KeyCode::Enter => {
            let pending = app.controller.submit_input();
            app.dispatch(pending, tx);
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.controller.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let cursor = app.input_cursor;
            let input = app.controller.input_mut();
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.controller.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.controller.input().chars().count();
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let cursor = app.input_cursor;
    let input = app.controller.input_mut();
    let byte_pos = char_to_byte_index(input, cursor);
    input.insert(byte_pos, c);
    app.input_cursor += 1;
}

fn handle_actions(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.actions_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.actions_next(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.activate_selected(tx);
            app.focus = FocusPane::Input;
        }
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_moods(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    if !app.controller.ui().mood.visible {
        app.focus = FocusPane::Input;
        return;
    }

    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.mood_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.mood_next(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let mood = Mood::ALL[app.mood_idx];
            app.select_mood(mood, tx);
        }
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if let Some(mood) = Mood::ALL.get(idx).copied() {
                app.mood_idx = idx;
                app.select_mood(mood, tx);
            }
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_panels = app.panel_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_down(3);
            } else if in_panels {
                app.panel_scroll = app.panel_scroll.saturating_add(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_up(3);
            } else if in_panels {
                app.panel_scroll = app.panel_scroll.saturating_sub(3);
            }
        }
        _ => {}
    }
}
