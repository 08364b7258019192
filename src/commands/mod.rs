//! Slash commands and message components

pub mod language_bar;
pub mod queue;
pub mod start;
