use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use companion_core::{ChatError, DecodedResult, PendingReset, PendingSend};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the typing ellipsis and the breathing guide
pub const TICK: Duration = Duration::from_millis(300);

/// Everything the draw loop reacts to: terminal input, the animation clock
/// and completions of requests running on spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    Reply(PendingSend, DecodedResult),
    ResetDone(PendingReset, Result<Value, ChatError>),
}

impl AppEvent {
    fn from_terminal(event: Event) -> Option<Self> {
        match event {
            // Release and repeat events would double every keystroke on some terminals
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            Event::Mouse(mouse) => Some(Self::Mouse(mouse)),
            Event::Resize(..) => Some(Self::Resize),
            _ => None,
        }
    }
}

pub struct EventHandler {
    rx: UnboundedReceiver<AppEvent>,
    tx: UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(tx.clone()));
        Self { rx, tx }
    }

    /// Handle for spawned requests to report back on
    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Forward terminal events and ticks until the receiving side goes away
async fn pump(tx: UnboundedSender<AppEvent>) {
    let mut terminal_events = EventStream::new();
    let mut ticks = tokio::time::interval(TICK);

    loop {
        let event = tokio::select! {
            _ = ticks.tick() => Some(AppEvent::Tick),
            next = terminal_events.next() => match next {
                Some(Ok(event)) => AppEvent::from_terminal(event),
                Some(Err(e)) => {
                    tracing::warn!("Terminal event error: {}", e);
                    None
                }
                None => break,
            },
        };

        if let Some(event) = event {
            if tx.send(event).is_err() {
                break;
            }
        }
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        default_hook(info);
    }));
}
