//! Language bar components: source/target buttons, swap, and the picker

use serenity::all::{
    ButtonStyle, ComponentInteraction, ComponentInteractionDataKind, Context, CreateActionRow,
    CreateButton, CreateInteractionResponse, CreateInteractionResponseMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption,
};
use std::sync::Arc;
use tracing::debug;

use crate::admission::Coordinator;
use crate::languages::{fmt_lang, is_supported, AUTO, LANGS};
use crate::store::UserSettings;

const SET_SRC: &str = "set_src";
const SET_DST: &str = "set_dst";
const SWAP: &str = "swap_langs";
const BACK: &str = "back_to_bar";
const PICK_PREFIX: &str = "pick:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "src",
            Side::Target => "dst",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "src" => Some(Side::Source),
            "dst" => Some(Side::Target),
            _ => None,
        }
    }
}

/// What a component interaction asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarAction {
    OpenPicker(Side),
    Swap,
    Back,
    Pick(Side, String),
}

impl BarAction {
    /// Decode a custom ID plus the values of a string select
    pub fn parse(custom_id: &str, values: &[String]) -> Option<Self> {
        match custom_id {
            SET_SRC => Some(BarAction::OpenPicker(Side::Source)),
            SET_DST => Some(BarAction::OpenPicker(Side::Target)),
            SWAP => Some(BarAction::Swap),
            BACK => Some(BarAction::Back),
            other => {
                let side = Side::from_str(other.strip_prefix(PICK_PREFIX)?)?;
                let code = values.first().filter(|code| is_supported(code))?;
                Some(BarAction::Pick(side, code.clone()))
            }
        }
    }
}

/// Main bar: current languages and the swap button
pub fn bar(settings: &UserSettings) -> Vec<CreateActionRow> {
    vec![
        CreateActionRow::Buttons(vec![
            CreateButton::new(SET_SRC)
                .label(format!("🌐 Input: {}", fmt_lang(&settings.source)))
                .style(ButtonStyle::Secondary),
            CreateButton::new(SET_DST)
                .label(format!("🎯 Output: {}", fmt_lang(&settings.target)))
                .style(ButtonStyle::Secondary),
        ]),
        CreateActionRow::Buttons(vec![CreateButton::new(SWAP)
            .label("🔁 Swap")
            .style(ButtonStyle::Primary)]),
    ]
}

/// Codes offered for one side; a target can never be `auto`
pub fn picker_codes(side: Side) -> Vec<&'static str> {
    LANGS
        .iter()
        .map(|(code, _)| *code)
        .filter(|code| side == Side::Source || *code != AUTO)
        .collect()
}

pub fn picker(side: Side) -> Vec<CreateActionRow> {
    let options = picker_codes(side)
        .into_iter()
        .map(|code| CreateSelectMenuOption::new(fmt_lang(code), code))
        .collect();

    let placeholder = match side {
        Side::Source => "Input language",
        Side::Target => "Output language",
    };

    vec![
        CreateActionRow::SelectMenu(
            CreateSelectMenu::new(
                format!("{}{}", PICK_PREFIX, side.as_str()),
                CreateSelectMenuKind::String { options },
            )
            .placeholder(placeholder),
        ),
        CreateActionRow::Buttons(vec![CreateButton::new(BACK)
            .label("⬅️ Back")
            .style(ButtonStyle::Secondary)]),
    ]
}

/// Apply an action to a user's settings; returns the rows to show next
pub fn apply(action: &BarAction, settings: &mut UserSettings) -> Vec<CreateActionRow> {
    match action {
        BarAction::OpenPicker(side) => picker(*side),
        BarAction::Swap => {
            settings.swap();
            bar(settings)
        }
        BarAction::Back => bar(settings),
        BarAction::Pick(Side::Source, code) => {
            settings.set_source(code);
            bar(settings)
        }
        BarAction::Pick(Side::Target, code) => {
            settings.set_target(code);
            bar(settings)
        }
    }
}

/// Handle a button press or picker selection
pub async fn handle(
    ctx: &Context,
    component: &ComponentInteraction,
    coordinator: Arc<Coordinator>,
) -> Result<(), serenity::Error> {
    let values = match &component.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.clone(),
        _ => Vec::new(),
    };

    let Some(action) = BarAction::parse(&component.data.custom_id, &values) else {
        debug!("Ignoring unknown component {}", component.data.custom_id);
        return Ok(());
    };

    let user_id = component.user.id.get();
    let mut rows = Vec::new();
    coordinator
        .users
        .update_settings(user_id, |settings| rows = apply(&action, settings));
    debug!("User {} language bar action {:?}", user_id, action);

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new().components(rows),
            ),
        )
        .await
}
