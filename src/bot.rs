//! Discord event handler and bot lifecycle

use crate::admission::{AdmissionResult, Coordinator};
use crate::commands;
use crate::config::Config;
use crate::executor::{try_notify, JobExecutor};
use crate::messages;
use crate::notifier::DiscordNotifier;
use crate::request::{classify, AttachmentInfo, ReplyTarget, Request};
use crate::services::{
    FfmpegTools, GoogleTranslator, HttpDownloader, Notifier, Reply, ServiceError, Services,
    WhisperConfig, WhisperTranscriber,
};
use crate::worker;
use serenity::all::{
    Client, Context, EventHandler, GatewayIntents, GuildId, Http, Interaction, Message, Ready,
};
use serenity::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
    #[error("Service setup failed: {0}")]
    Service(#[from] ServiceError),
}

/// Bot state shared across handlers
pub struct BotState {
    pub config: Arc<Config>,
    pub coordinator: Arc<Coordinator>,
    pub notifier: Arc<dyn Notifier>,
}

/// Main event handler for the bot
pub struct Handler {
    pub state: Arc<BotState>,
}

/// Remove `<@id>` and `<@!id>` mentions of the bot
fn strip_mention(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@{}>", bot_id), "")
        .replace(&format!("<@!{}>", bot_id), "")
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.name);

        let commands = vec![commands::start::register(), commands::queue::register()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        // If guild ID is set, register to specific guild (faster for dev)
        if let Some(guild_id) = self.state.config.guild_id {
            let guild = GuildId::new(guild_id);
            match guild.set_commands(&ctx.http, commands).await {
                Ok(cmds) => info!("Registered {} guild commands", cmds.len()),
                Err(e) => error!("Failed to register guild commands: {}", e),
            }
        } else {
            match serenity::all::Command::set_global_commands(&ctx.http, commands).await {
                Ok(cmds) => info!("Registered {} global commands", cmds.len()),
                Err(e) => error!("Failed to register global commands: {}", e),
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // Direct messages always, guild messages only when addressed to the bot
        let bot_id = ctx.cache.current_user().id;
        if msg.guild_id.is_some() && !msg.mentions_user_id(bot_id) {
            return;
        }

        let attachments: Vec<AttachmentInfo> = msg
            .attachments
            .iter()
            .map(|a| AttachmentInfo {
                url: a.url.clone(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
                duration_secs: a.duration_secs,
            })
            .collect();

        let text = strip_mention(&msg.content, bot_id.get());
        let Some(kind) = classify(&text, &attachments) else {
            return;
        };

        let user_id = msg.author.id.get();
        let target = ReplyTarget {
            user_id,
            channel_id: msg.channel_id.get(),
        };
        let coordinator = &self.state.coordinator;

        let reply = match coordinator.submit(user_id, Request { reply: target, kind }) {
            AdmissionResult::Accepted {
                job_id,
                position,
                depth,
            } => messages::accepted(job_id, position, depth),
            AdmissionResult::Rejected(rejection) => {
                messages::rejected(&rejection, &coordinator.limits())
            }
        };

        try_notify(
            self.state.notifier.as_ref(),
            target,
            Reply::with_bar(reply, coordinator.users.settings(user_id)),
        )
        .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let coordinator = self.state.coordinator.clone();
        let result = match interaction {
            Interaction::Command(command) => match command.data.name.as_str() {
                "start" => commands::start::handle(&ctx, &command, coordinator).await,
                "queue" => commands::queue::handle(&ctx, &command, coordinator).await,
                _ => Ok(()),
            },
            Interaction::Component(component) => {
                commands::language_bar::handle(&ctx, &component, coordinator).await
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            error!("Interaction error: {}", e);
        }
    }
}

/// Create and run the Discord bot
pub async fn run(config: Config) -> Result<(), BotError> {
    let config = Arc::new(config);
    let coordinator = Arc::new(Coordinator::new(config.limits));

    let media = FfmpegTools::new();
    if let Err(e) = media.ensure_installed().await {
        warn!("Audio requests will fail: {}", e);
    }

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let notifier: Arc<dyn Notifier> =
        Arc::new(DiscordNotifier::new(Arc::new(Http::new(&config.discord_token))));
    let services = Services {
        notifier: notifier.clone(),
        downloader: Arc::new(HttpDownloader::new()?),
        media: Arc::new(media),
        transcriber: Arc::new(WhisperTranscriber::new(WhisperConfig {
            model_path: config.whisper_model.clone(),
            threads: config.whisper_threads,
            device: config.whisper_device,
        })),
        translator: Arc::new(GoogleTranslator::new()?),
    };

    let state = Arc::new(BotState {
        config: config.clone(),
        coordinator: coordinator.clone(),
        notifier,
    });

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler { state })
        .await?;

    let executor = Arc::new(JobExecutor::new(
        coordinator.clone(),
        services,
        config.temp_audio_dir.clone(),
    ));
    let worker = worker::spawn(coordinator.clone(), executor);

    let shard_manager = client.shard_manager.clone();
    info!("Starting bot...");
    tokio::select! {
        result = client.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, stopping gateway");
            shard_manager.shutdown_all().await;
        }
    }

    // Let queued jobs finish; no new ones can arrive without the gateway
    info!("Waiting up to {:?} for {} pending jobs", config.shutdown_grace, coordinator.queue.depth());
    if tokio::time::timeout(config.shutdown_grace, coordinator.queue.join())
        .await
        .is_err()
    {
        warn!("Shutdown grace period elapsed with {} jobs pending", coordinator.queue.depth());
    }
    worker.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_mention() {
        assert_eq!(strip_mention("<@42> hello", 42).trim(), "hello");
        assert_eq!(strip_mention("hi <@!42>", 42).trim(), "hi");
        assert_eq!(strip_mention("<@7> hello", 42), "<@7> hello");
    }
}
