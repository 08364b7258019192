//! /start: greeting, limits and the language bar

use serenity::all::{
    CommandInteraction, Context, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use std::sync::Arc;
use tracing::info;

use crate::admission::Coordinator;
use crate::commands::language_bar;
use crate::messages;

/// Register the start command
pub fn register() -> Vec<CreateCommand> {
    vec![CreateCommand::new("start").description("Show languages, limits and how to use the bot")]
}

/// Handle /start command
pub async fn handle(
    ctx: &Context,
    command: &CommandInteraction,
    coordinator: Arc<Coordinator>,
) -> Result<(), serenity::Error> {
    let user_id = command.user.id.get();
    let settings = coordinator.users.settings(user_id);

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(messages::start_text(&settings, &coordinator.limits()))
                    .components(language_bar::bar(&settings)),
            ),
        )
        .await?;

    info!("User {} started the bot ({} known users)", user_id, coordinator.users.len());
    Ok(())
}
