use std::ops::RangeInclusive;

use crate::CommandMeta;
use crate::leveling::embeds::{guild_only_message, usage_message};
use saphy_core::{Context, Error};
use saphy_database::impls::leveling_config::set_rates;
use saphy_leveling::LevelingStore;
use saphy_utils::embed::{DEFAULT_EMBED_COLOR, error_embed, status_embed, success_embed};
use tracing::info;

pub const META: CommandMeta = CommandMeta {
    name: "levelrates",
    desc: "View or set XP per minute and XP per level.",
    category: "leveling",
    usage: "!levelrates [xp_per_minute xp_per_level]",
};

pub const XP_PER_MINUTE_RANGE: RangeInclusive<u64> = 1..=100;
pub const XP_PER_LEVEL_RANGE: RangeInclusive<u64> = 10..=1000;

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    category = "Leveling"
)]
pub async fn levelrates(
    ctx: Context<'_>,
    #[description = "XP earned per minute in voice (1-100)"] xp_per_minute: Option<u64>,
    #[description = "XP needed per level (10-1000)"] xp_per_level: Option<u64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };
    let db = &ctx.data().db;

    match (xp_per_minute, xp_per_level) {
        (None, None) => {
            let config = db.guild_config(guild_id.get()).await;
            let summary = format!(
                "**XP per minute:** {}\n**XP per level:** {}",
                config.xp_per_minute, config.xp_per_level
            );
            ctx.send(
                poise::CreateReply::default()
                    .embed(status_embed(summary, DEFAULT_EMBED_COLOR).title("Leveling rates")),
            )
            .await?;
        }
        (Some(per_minute), Some(per_level)) => {
            if let Err(reason) = validate_rates(per_minute, per_level) {
                ctx.send(
                    poise::CreateReply::default()
                        .embed(error_embed(reason))
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }

            set_rates(db, guild_id.get(), per_minute, per_level).await?;
            info!(
                guild_id = guild_id.get(),
                xp_per_minute = per_minute,
                xp_per_level = per_level,
                "leveling rates updated"
            );
            ctx.send(poise::CreateReply::default().embed(success_embed(format!(
                "Members now earn **{}** XP per minute and need **{}** XP per level.",
                per_minute, per_level
            ))))
            .await?;
        }
        _ => {
            ctx.say(usage_message(META.usage)).await?;
        }
    }

    Ok(())
}

fn validate_rates(xp_per_minute: u64, xp_per_level: u64) -> Result<(), String> {
    if !XP_PER_MINUTE_RANGE.contains(&xp_per_minute) {
        return Err(format!(
            "XP per minute must be between {} and {}.",
            XP_PER_MINUTE_RANGE.start(),
            XP_PER_MINUTE_RANGE.end()
        ));
    }

    if !XP_PER_LEVEL_RANGE.contains(&xp_per_level) {
        return Err(format!(
            "XP per level must be between {} and {}.",
            XP_PER_LEVEL_RANGE.start(),
            XP_PER_LEVEL_RANGE.end()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_rates;

    #[test]
    fn bounds_are_inclusive() {
        assert!(validate_rates(1, 10).is_ok());
        assert!(validate_rates(100, 1000).is_ok());
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        assert!(validate_rates(0, 100).is_err());
        assert!(validate_rates(101, 100).is_err());
        assert!(validate_rates(5, 9).is_err());
        assert!(validate_rates(5, 1001).is_err());
    }
}
