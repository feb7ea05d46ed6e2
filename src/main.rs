mod action;
mod app;
mod auth;
mod backend;
mod config;
mod editor;
mod error;
mod export;
mod hubnote;
mod listview;
mod toast;
mod tui;
mod types;
mod ui;
mod validate;

use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::backend::Backend;
use crate::config::Config;
use crate::hubnote::HubNote;
use crate::tui::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(250);
const RENDER_RATE: Duration = Duration::from_millis(16); // ~60fps

/// Browse the repositories, issues, and comments mirrored by a HubNote server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Server to talk to (overrides `server.base_url` in config.toml)
    #[arg(long)]
    base_url: Option<String>,

    /// Open straight into a repository's issues, e.g. `octo/hello`
    #[arg(long)]
    repo: Option<String>,

    /// Where exports are written (overrides `ui.export_dir`)
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();

    let mut config = Config::load();
    if let Some(base_url) = args.base_url {
        config.server.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.export_dir {
        config.ui.export_dir = Some(dir);
    }
    config.check()?;

    let initial_repo = args.repo.as_deref().map(validate::full_name).transpose()?;

    let session = auth::load_session(&config.server)?;
    let backend: Arc<dyn Backend> = Arc::new(HubNote::new(&config.server.base_url, &session)?);
    tracing::info!(base_url = %config.server.base_url, "starting");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(backend, config, initial_repo).await;

    // Restore terminal
    tui::restore()?;

    result
}

/// Log to a file: stderr is the terminal ratatui draws on.
/// Without a writable log file the subscriber is not installed at all.
fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

async fn run(
    backend: Arc<dyn Backend>,
    config: Config,
    initial_repo: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;
    let editor_cmd = editor::detect_editor();

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(backend, action_tx.clone(), &config);

    match initial_repo {
        Some(repo) => app.open_repo(repo),
        None => action_tx.send(app.handle_event(Event::Init))?,
    }

    let mut events = EventHandler::new(TICK_RATE, RENDER_RATE);

    loop {
        let action = tokio::select! {
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
                continue;
            }
            Some(action) = action_rx.recv() => action,
            else => break,
        };

        match action {
            Action::SuspendForEditor(ctx) => {
                // The event reader would compete with the editor for stdin
                drop(events);
                let initial = ctx.initial_text().to_string();
                let result = tui::suspend(&mut terminal, || editor::edit(&initial, &editor_cmd))?;
                events = EventHandler::new(TICK_RATE, RENDER_RATE);
                app.editor_finished(ctx, result);
            }
            action => app.update(action),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
