// File: src/platforms/discord/mod.rs

pub mod embed;
pub mod runtime;

pub use runtime::{DiscordMessageEvent, DiscordPlatform};
