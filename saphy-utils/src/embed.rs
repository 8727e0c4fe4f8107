use poise::serenity_prelude as serenity;

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0xFF_D7_00;
/// Level-up announcements when the guild has not picked a color.
pub const LEVEL_UP_EMBED_COLOR: u32 = 0x00_FF_00;
pub const SUCCESS_EMBED_COLOR: u32 = 0x00_FF_00;
pub const ERROR_EMBED_COLOR: u32 = 0xFF_00_00;

/// Short single-line status embed, used for command confirmations.
pub fn status_embed(description: impl Into<String>, color: u32) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .color(color)
        .description(description)
}

pub fn success_embed(description: impl Into<String>) -> serenity::CreateEmbed {
    status_embed(description, SUCCESS_EMBED_COLOR)
}

pub fn error_embed(description: impl Into<String>) -> serenity::CreateEmbed {
    status_embed(description, ERROR_EMBED_COLOR)
}
