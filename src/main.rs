use anyhow::{Context, Result};
use clap::Parser;
use sidechat::clipboard::SystemClipboard;
use sidechat::config::Config;
use sidechat::llm::LlmClient;
use sidechat::session::ConversationSession;
use sidechat::tui::{self, EventHandler};
use sidechat::ui::{self, conversation::ConversationManager};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "sidechat")]
#[command(version)]
#[command(about = "Chat with a hosted LLM from your terminal", long_about = None)]
struct Cli {
    /// Model identifier sent with every request
    #[arg(short, long)]
    model: Option<String>,

    /// Chat completions endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Config file (default: ~/.sidechat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key; skips the key prompt. Never written to disk.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.model, cli.endpoint);
    let _log_guard = sidechat::logging::init(&config.log_dir())?;

    info!(model = %config.model, endpoint = %config.endpoint, "starting sidechat");
    run(config, cli.api_key).await
}

async fn run(config: Config, api_key: Option<String>) -> Result<()> {
    let client = LlmClient::new(&config)?;
    let session = match api_key {
        Some(key) => ConversationSession::with_credential(config.copy_feedback(), key),
        None => ConversationSession::new(config.copy_feedback()),
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut manager = ConversationManager::new(
        session,
        client,
        Box::new(SystemClipboard::new()),
        events.sender(),
        &config,
    );

    let result = async {
        loop {
            terminal
                .draw(|frame| ui::render(&manager, frame))
                .context("Failed to draw frame")?;

            if manager.should_quit() {
                break;
            }

            match events.next().await {
                Some(event) => manager.handle_event(event, Instant::now()),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!(messages = manager.session().messages().len(), "sidechat exiting");
    result
}
