use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dsagpt_core::speech::UnsupportedRecognizer;
use dsagpt_core::{
    events, AccountClient, ChatServices, CommandRecognizer, Config, InferenceClient, Recognizer,
    TurnOrchestrator,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// DSA-GPT: a terminal chat tutor for data structures and algorithms
#[derive(Parser, Debug)]
#[command(name = "dsagpt", version, about)]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

/// The terminal is owned by the UI, so logs go to a file in the data directory
fn init_logging(debug: bool) -> Result<Option<PathBuf>> {
    let Some(data_dir) = dirs::data_local_dir() else {
        return Ok(None);
    };
    let log_dir = data_dir.join("dsagpt");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("dsagpt.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(Some(log_path))
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => Config::load(),
    }
}

fn build_recognizer(config: &Config) -> Box<dyn Recognizer> {
    match config
        .dictation_command
        .as_deref()
        .and_then(CommandRecognizer::from_command_line)
    {
        Some(recognizer) => {
            tracing::info!(program = recognizer.program(), "Using dictation program");
            Box::new(recognizer)
        }
        None => {
            tracing::warn!("No dictation program configured");
            Box::new(UnsupportedRecognizer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(cli.debug)?;
    let config = load_config(cli.config.as_ref())?;
    tracing::info!(
        inference = %config.inference_url,
        account = %config.account_url,
        log = ?log_path,
        "Starting dsagpt"
    );

    let timeout = config.request_timeout();
    let inference = InferenceClient::new(&config.inference_url, timeout)?;
    let account = AccountClient::new(&config.account_url, config.session_cookie.clone(), timeout)?;

    let (chat_tx, chat_rx) = events::channel();
    let services = ChatServices {
        inference: Arc::new(inference),
        history: Arc::new(account.clone()),
        identity: Arc::new(account.clone()),
        recognizer: build_recognizer(&config),
    };
    let chat = TurnOrchestrator::new(services, config.turn_settings(), chat_tx);

    // Nothing else is loaded when dictation is unavailable
    if chat.speech_supported() {
        chat.resolve_identity();
    }

    let mut app = App::new(chat, account);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(chat_rx);

    let result = run(&mut app, &mut terminal, &mut events).await;

    app.chat.stop_dictation();
    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
