// File: src/platforms/discord/embed.rs

use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use crate::models::{ColorState, DisplayPayload};

/// Discord's stock green / red embed colors.
pub const COLOR_ALL_ONLINE: u32 = 0x2ecc71;
pub const COLOR_SOME_OFFLINE: u32 = 0xe74c3c;

pub fn payload_to_embed(payload: &DisplayPayload) -> Embed {
    let color = match payload.color_state {
        ColorState::AllOnline => COLOR_ALL_ONLINE,
        ColorState::SomeOffline => COLOR_SOME_OFFLINE,
    };

    let mut builder = EmbedBuilder::new()
        .title(&payload.title)
        .description(&payload.description)
        .color(color);

    for (label, body) in &payload.fields {
        builder = builder.field(EmbedFieldBuilder::new(label, body));
    }

    builder.build()
}
