use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;

use saphy_database::model::leveling::{GuildLevelingConfig, UserProgress};
use saphy_leveling::arithmetic::{level_progress, xp_for_level};
use saphy_utils::embed::{DEFAULT_EMBED_COLOR, LEVEL_UP_EMBED_COLOR};
use saphy_utils::formatting::{
    format_thousands, percent, progress_bar, rank_label, render_level_message,
};

pub const DEFAULT_LEVEL_UP_MESSAGES: [&str; 5] = [
    "🎉 Congratulations {user}! You've just leveled up to level **{level}**! Your dedication to voice activity is paying off, so keep chatting and climbing the ranks!",
    "🚀 {user} just blasted off to level **{level}**! Keep it up, superstar. You're making waves in the server with your awesome presence!",
    "⭐ Amazing job, {user}! You've reached level **{level}**! Your voice is a beacon of energy. Shine on and inspire others to join the fun!",
    "🎊 {user} is now level **{level}**! Fantastic job on this milestone. What an incredible journey you've embarked on in our community!",
    "🌟 {user} leveled up to **{level}**! You're on fire and it's contagious. Keep the momentum going and light up the server even more!",
];

const PROGRESS_BAR_WIDTH: usize = 12;

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{}`", usage)
}

/// Random template from the guild's list, or from the built-in ones when it
/// has none.
pub fn pick_level_up_message(messages: &[String]) -> String {
    let mut rng = rand::thread_rng();
    messages
        .choose(&mut rng)
        .cloned()
        .or_else(|| {
            DEFAULT_LEVEL_UP_MESSAGES
                .choose(&mut rng)
                .map(|template| (*template).to_owned())
        })
        .unwrap_or_default()
}

/// Level-up announcement embed. `fallback_image` is used when the guild has
/// not configured a notification image.
pub fn level_up_embed(
    config: &GuildLevelingConfig,
    display_name: &str,
    avatar_url: Option<String>,
    fallback_image: Option<String>,
    level: u64,
) -> serenity::CreateEmbed {
    let template = pick_level_up_message(&config.messages);

    let mut embed = serenity::CreateEmbed::new()
        .color(config.embed_color.unwrap_or(LEVEL_UP_EMBED_COLOR))
        .description(render_level_message(&template, display_name, level))
        .timestamp(serenity::Timestamp::now());

    if let Some(avatar_url) = avatar_url {
        embed = embed.thumbnail(avatar_url);
    }

    if let Some(image) = config.notification_image.clone().or(fallback_image) {
        embed = embed.image(image);
    }

    embed
}

/// Body of the `level` embed.
pub fn profile_description(progress: &UserProgress, xp_per_level: u64, rank: Option<u64>) -> String {
    let (into_level, level_size) = level_progress(progress.xp, xp_per_level);
    let next_level_at = xp_for_level(progress.level.saturating_add(1), xp_per_level);

    let mut out = format!(
        "**Level:** {}\n**XP:** {}\n**Next level at:** {} XP\n\n{} {}%\n{} / {} XP",
        progress.level,
        format_thousands(progress.xp),
        format_thousands(next_level_at),
        progress_bar(into_level, level_size, PROGRESS_BAR_WIDTH),
        percent(into_level, level_size),
        format_thousands(into_level),
        format_thousands(level_size),
    );

    if let Some(rank) = rank {
        out.push_str(&format!("\n\n**Rank:** #{}", format_thousands(rank)));
    }

    out
}

pub fn profile_embed(
    display_name: &str,
    avatar_url: Option<String>,
    description: String,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{}'s voice level", display_name))
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    if let Some(avatar_url) = avatar_url {
        embed = embed.thumbnail(avatar_url);
    }

    embed
}

pub fn no_activity_message(display_name: &str) -> String {
    format!("{} hasn't gained any voice activity yet!", display_name)
}

/// One leaderboard line. `rank` is 1-based and counts across pages.
pub fn leaderboard_line(rank: usize, entry: &UserProgress) -> String {
    format!(
        "{} <@{}> • Level **{}** • {} XP",
        rank_label(rank),
        entry.user_id,
        entry.level,
        format_thousands(entry.xp)
    )
}
