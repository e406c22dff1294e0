//! legal-chat - terminal client for the legal question-answering backend

mod app;
mod handler;
mod oneshot;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use legal_chat_core::{ChatClient, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "legal-chat")]
#[command(version, about = "Ask questions about the Constitution of Pakistan", long_about = None)]
struct Args {
    /// Backend base URL (overrides LEGAL_CHAT_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Ask a single question, print the reply and exit
    #[arg(short, long)]
    ask: Option<String>,

    /// Check that the backend is reachable and exit
    #[arg(long)]
    check: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let interactive = args.ask.is_none() && !args.check;
    init_logging(args.debug, interactive)?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    let api_url = config.resolve_api_url(args.api_url.as_deref());
    let client = ChatClient::with_timeout(&api_url, config.request_timeout())?;
    tracing::info!(%api_url, "using backend");

    if args.check {
        let ok = oneshot::check_backend(&client, &mut io::stdout(), &mut io::stderr()).await?;
        return Ok(exit_code(ok));
    }

    if let Some(question) = args.ask {
        let ok = oneshot::ask_once(&client, &question, &mut io::stdout(), &mut io::stderr()).await?;
        return Ok(exit_code(ok));
    }

    run_tui(client, &config, api_url).await?;
    Ok(ExitCode::SUCCESS)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_tui(client: ChatClient, config: &Config, api_url: String) -> Result<()> {
    let mut events = EventHandler::new();

    // Report backend reachability in the header
    let health_client = client.clone();
    let health_tx = events.sender();
    tokio::spawn(async move {
        let result = health_client.health().await.map_err(|e| e.to_string());
        let _ = health_tx.send(AppEvent::Health(result));
    });

    let mut app = App::new(config.greeting(), api_url, Arc::new(client), events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    tracing::info!(messages = app.conversation.len(), "session ended");
    Ok(())
}

/// The TUI owns the terminal, so interactive sessions log to a file.
/// One-shot commands log to stderr.
fn init_logging(debug: bool, to_file: bool) -> Result<()> {
    let default_filter = if debug {
        "debug"
    } else if to_file {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if to_file {
        let path = log_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

fn log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("legal-chat")
        .join("legal-chat.log")
}
