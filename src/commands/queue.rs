//! /queue: pending job count and the first job IDs

use serenity::all::{
    CommandInteraction, Context, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use std::sync::Arc;

use crate::admission::Coordinator;
use crate::commands::language_bar;
use crate::messages::{self, QUEUE_PREVIEW};

/// Register the queue command
pub fn register() -> Vec<CreateCommand> {
    vec![CreateCommand::new("queue").description("Show how many requests are waiting")]
}

/// Handle /queue command
pub async fn handle(
    ctx: &Context,
    command: &CommandInteraction,
    coordinator: Arc<Coordinator>,
) -> Result<(), serenity::Error> {
    let settings = coordinator.users.settings(command.user.id.get());
    let status = coordinator.status(QUEUE_PREVIEW);

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(messages::queue_status(&status))
                    .components(language_bar::bar(&settings)),
            ),
        )
        .await
}
