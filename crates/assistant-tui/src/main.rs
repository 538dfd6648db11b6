//! Terminal chat client for a local Ollama server, behind a Supabase login.

mod app;
mod handler;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use assistant_core::{Config, InferenceProvider, OllamaClient, SessionGate, SupabaseAuth};
use clap::Parser;
use log::{info, warn};

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "ollama-assistant", version)]
#[command(about = "Chat with a local Ollama model from the terminal")]
struct Cli {
    /// Path to a config.json (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,
    /// Model to generate with
    #[arg(short, long)]
    model: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Log file (defaults to the user data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Write the resolved configuration to the config file and exit
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = Config::load_from(path)?;
                config.apply_overrides(|key| std::env::var(key).ok());
                config
            }
            None => Config::load()?,
        };

        if let Some(url) = &self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
        Ok(config)
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::get_config_path(),
        }
    }

    fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Config::get_log_path(),
        }
    }
}

/// Send log records to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = env_logger::builder()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

/// Warn early when Ollama is down or the model has not been pulled.
fn spawn_health_check(client: OllamaClient) {
    tokio::spawn(async move {
        let model = client.model().to_string();
        match client.has_model(&model).await {
            Ok(true) => info!("model {} available at {}", model, client.base_url()),
            Ok(false) => warn!(
                "model {} not found at {}; run `ollama pull {}`",
                model,
                client.base_url(),
                model
            ),
            Err(err) => warn!("Ollama health check failed: {}", err),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = cli.log_path()?;
    if let Err(err) = init_logging(&log_path) {
        eprintln!("logging disabled: {:#}", err);
    }

    let config = cli.resolve_config().context("failed to load configuration")?;

    if cli.init_config {
        let path = cli.config_path()?;
        config.save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let (supabase_url, anon_key) = config.supabase()?;
    let auth = SupabaseAuth::new(supabase_url, anon_key, config.auth_timeout())
        .context("failed to build auth client")?;
    let gate = SessionGate::new(Arc::new(auth));

    let ollama = OllamaClient::new(&config.ollama_url, &config.model);
    info!(
        "starting with model {} at {} (timeout {:?})",
        config.model,
        ollama.base_url(),
        config.request_timeout()
    );
    spawn_health_check(ollama.clone());
    let inference: Arc<dyn InferenceProvider> = Arc::new(ollama);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(gate, inference, config.request_timeout(), events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
