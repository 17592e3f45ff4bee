//! Binary entry point: load settings, set up logging, run the bot.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use factbot::bot;
use factbot::config::Settings;

#[derive(Parser)]
#[command(name = "factbot", version, about = "Telegram facts & predictions bot")]
struct Cli {
    /// Override the user store path (FACTBOT_STORAGE).
    #[arg(long)]
    storage: Option<std::path::PathBuf>,

    /// Override the response cache TTL in seconds (FACTBOT_CACHE_TTL).
    #[arg(long)]
    cache_ttl: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("Failed to load configuration")?;
    if let Some(storage) = cli.storage {
        settings.storage_path = storage;
    }
    if let Some(ttl) = cli.cache_ttl {
        settings.cache_ttl_secs = ttl;
    }

    bot::run(settings).await.context("Bot terminated with an error")
}
