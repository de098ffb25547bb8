mod api;
mod engine;

#[cfg(test)]
mod testutil;

use clap::{Parser, Subcommand};
use minder_channels::telegram::TelegramChannel;
use minder_core::{
    config,
    traits::{Channel, Provider},
};
use minder_providers::openai::OpenAiProvider;
use minder_store::Store;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "minder",
    version,
    about = "Minder — accountability agent engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the trigger API server.
    Start,
    /// Check configuration and store health.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            let provider = build_provider(&cfg)?;
            if !provider.is_available().await {
                // The engine degrades to canned text, so this is not fatal.
                warn!("provider '{}' is not reachable right now", provider.name());
            }

            let channel = build_channel(&cfg)?;
            let store = Store::new(&cfg.store).await?;
            let engine = engine::Engine::new(store, provider, channel, cfg.engine.clone());

            println!("Minder — starting trigger API...");
            api::serve(&cfg.api, Arc::new(engine)).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Minder — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Database: {}", cfg.store.db_path);

            match &cfg.channel.telegram {
                Some(tg) if tg.enabled && !tg.bot_token.is_empty() => {
                    println!("  telegram: configured")
                }
                Some(tg) if tg.enabled => println!("  telegram: enabled but missing bot_token"),
                Some(_) => println!("  telegram: disabled"),
                None => println!("  telegram: not configured"),
            }

            match &cfg.provider.openai {
                Some(oa) if !oa.api_key.is_empty() => {
                    println!("  openai: configured (model {})", oa.model)
                }
                Some(_) => println!("  openai: missing api_key"),
                None => println!("  openai: not configured"),
            }

            let store = Store::new(&cfg.store).await?;
            println!("\nUsers: {}", store.user_count().await?);
        }
    }

    Ok(())
}

/// Build the configured text generator.
fn build_provider(cfg: &config::Config) -> anyhow::Result<Arc<dyn Provider>> {
    let oa = cfg.provider.openai.as_ref().ok_or_else(|| {
        anyhow::anyhow!(
            "no provider configured. Set [provider.openai] in config.toml \
             or the OPENAI_API_KEY env var."
        )
    })?;
    Ok(Arc::new(OpenAiProvider::from_config(
        oa.base_url.clone(),
        oa.api_key.clone(),
        oa.model.clone(),
    )))
}

/// Build the configured outbound channel.
fn build_channel(cfg: &config::Config) -> anyhow::Result<Arc<dyn Channel>> {
    let tg = cfg
        .channel
        .telegram
        .as_ref()
        .filter(|tg| tg.enabled)
        .ok_or_else(|| {
            anyhow::anyhow!("no channel enabled. Enable [channel.telegram] in config.toml.")
        })?;
    if tg.bot_token.is_empty() {
        anyhow::bail!(
            "Telegram is enabled but bot_token is empty. \
             Set it in config.toml or the TELEGRAM_BOT_TOKEN env var."
        );
    }
    Ok(Arc::new(TelegramChannel::new(tg)))
}
