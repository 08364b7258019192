//! Translator bot
//!
//! A Discord bot that translates text and transcribes/translates audio.
//! Requests from all users go through one queue and are processed one at a
//! time by a single background worker.

mod admission;
mod bot;
mod commands;
mod config;
mod executor;
mod languages;
mod messages;
mod notifier;
mod queue;
mod request;
mod services;
mod store;
mod worker;

use config::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,translator_bot=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Translator bot starting...");

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please ensure DISCORD_TOKEN is set in .env file");
            std::process::exit(1);
        }
    };

    info!(
        "Configuration loaded (text limit {} chars, audio limit {}s)",
        config.limits.text_chars, config.limits.audio_secs
    );
    if let Some(guild_id) = config.guild_id {
        info!("Development mode: Commands will be registered to guild {}", guild_id);
    }

    // Create temp audio directory
    if let Err(e) = std::fs::create_dir_all(&config.temp_audio_dir) {
        error!("Failed to create temp audio directory: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = bot::run(config).await {
        error!("Bot error: {}", e);
        std::process::exit(1);
    }

    info!("Translator bot stopped");
}
