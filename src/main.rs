mod action;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod github;
mod service;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::github::GitHub;
use crate::service::RepoService;
use crate::tui::EventHandler;
use crate::types::RepoId;

/// Browse the issues of a GitHub repository
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Repository as owner/name (percent-encoding is accepted)
    repository: String,

    /// Issues per page, clamped to 1-100
    #[arg(long, allow_negative_numbers = true)]
    per_page: Option<i64>,

    /// Base URL of the REST API
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let repo = RepoId::decode(&cli.repository)?;

    let config = Config::load().with_overrides(cli.api_url, cli.per_page);
    let token = auth::load_token(&config.api);
    let github = GitHub::new(&config.api.base_url, token)?;
    tracing::info!(%repo, service = github.name(), per_page = config.per_page(), "starting");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(repo, Arc::new(github), config.per_page()).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    repo: RepoId,
    service: Arc<dyn RepoService>,
    per_page: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(repo, service, per_page, action_tx.clone());

    let tick_rate = Duration::from_millis(100);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
