mod app;
mod handler;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use companion_core::{CompanionClient, Config, ConversationController};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use tui::EventHandler;

/// Mind Companion - a terminal client for the mental health support chatbot
#[derive(Parser, Debug)]
#[command(name = "companion")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server base URL (overrides the config file)
    #[arg(long, env = "COMPANION_URL")]
    url: Option<String>,

    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Use the light theme for this run
    #[arg(long, conflicts_with = "dark")]
    light: bool,

    /// Use the dark theme for this run
    #[arg(long)]
    dark: bool,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable trace logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn default_filter(&self) -> &'static str {
        if self.verbose {
            "trace"
        } else if self.debug {
            "debug"
        } else {
            "warn"
        }
    }

    /// Theme forced on the command line, if any
    fn theme_override(&self) -> Option<bool> {
        match (self.dark, self.light) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Could not read config, using defaults: {}", e);
        Config::new()
    });

    let base_url = args.url.clone().unwrap_or_else(|| config.base_url().to_string());
    let client = CompanionClient::with_timeout(&base_url, config.request_timeout());

    match args.prompt.clone() {
        Some(prompt) => {
            init_stderr_logging(&args);
            run_once(&client, &prompt).await
        }
        None => {
            init_file_logging(&args)?;
            let dark_mode = args.theme_override().unwrap_or(config.dark_mode);
            // A theme forced for one run is not written back
            let persist_theme = args.theme_override().is_none();
            run_tui(App::new(client, dark_mode, persist_theme)).await
        }
    }
}

fn init_stderr_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// The full-screen UI owns the terminal, so logs go to a file in the config directory
fn init_file_logging(args: &Args) -> Result<()> {
    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("companion.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

/// One-shot mode: send a message and print what the chat window would show
async fn run_once(client: &CompanionClient, prompt: &str) -> Result<()> {
    let mut controller = ConversationController::default();
    if !controller.send(client, prompt).await {
        anyhow::bail!("Nothing to send: the prompt is empty");
    }

    let ui = controller.ui();
    if let Some(entry) = ui.timeline.last_bot() {
        println!("{}", entry.rendered.body.to_plain_text());

        if let Some(resources) = ui.panels.resources() {
            println!("\n== Resources ==");
            println!("{}", resources.summary);
            for item in &resources.items {
                println!("\n{}\n  {}", item.name, item.description);
                for detail in &item.details {
                    match detail.url() {
                        Some(url) => println!("  {} <{}>", detail.label(), url),
                        None => println!("  {}", detail.label()),
                    }
                }
            }
        }

        if let Some(exercise) = ui.panels.exercise() {
            println!("\n== Try this exercise ==");
            println!("{}\n{}\n{}", exercise.name, exercise.description, exercise.benefits_line());
            if let Some(guide) = &exercise.breathing_guide {
                for step in guide.instructions() {
                    println!("  {}", step);
                }
            }
        }

        if let Some(level) = ui.concern_level {
            println!("\n[concern: {}]", level.as_str());
        }

        if !entry.rendered.suggestions.is_empty() {
            println!("\nSuggestions: {}", entry.rendered.suggestions.join(" | "));
        }
    }

    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();

    tracing::info!("Connected to {}", app.client.base_url());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
