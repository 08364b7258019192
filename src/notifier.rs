//! Delivers replies to Discord channels

use async_trait::async_trait;
use serenity::all::{ChannelId, CreateMessage, Http};
use std::sync::Arc;

use crate::commands::language_bar;
use crate::request::ReplyTarget;
use crate::services::{Notifier, NotifyError, Reply};

/// Discord rejects message content above 2000 characters
const CHUNK_CHARS: usize = 1900;

pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// Split on character boundaries, preferring the last newline in each chunk
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > max_chars {
        let cut = rest[..max_chars]
            .iter()
            .rposition(|c| *c == '\n')
            .filter(|idx| *idx > 0)
            .map(|idx| idx + 1)
            .unwrap_or(max_chars);
        chunks.push(rest.drain(..cut).collect());
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.into_iter().collect());
    }
    chunks
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, target: ReplyTarget, reply: Reply) -> Result<(), NotifyError> {
        let channel = ChannelId::new(target.channel_id);
        let chunks = split_message(&reply.text, CHUNK_CHARS);
        let last = chunks.len() - 1;

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let mut message = CreateMessage::new().content(chunk);
            if idx == last {
                if let Some(settings) = &reply.bar {
                    message = message.components(language_bar::bar(settings));
                }
            }
            channel
                .send_message(&self.http, message)
                .await
                .map_err(|e| NotifyError(e.to_string()))?;
        }
        Ok(())
    }
}
