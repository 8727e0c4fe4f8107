use anyhow::Context as _;

use crate::cache::{CONFIG_CACHE_TTL, invalidate_leveling_config, leveling_config_key};
use crate::database::Database;
use crate::model::leveling::GuildLevelingConfig;

#[derive(sqlx::FromRow)]
struct LevelingConfigRow {
    xp_per_minute: Option<i64>,
    xp_per_level: Option<i64>,
    notification_channel_id: Option<i64>,
    embed_color: Option<i32>,
    notification_image: Option<String>,
    messages: Vec<String>,
}

impl LevelingConfigRow {
    fn into_config(self, guild_id: u64) -> GuildLevelingConfig {
        let defaults = GuildLevelingConfig::defaults(guild_id);

        GuildLevelingConfig {
            guild_id,
            xp_per_minute: positive(self.xp_per_minute).unwrap_or(defaults.xp_per_minute),
            xp_per_level: positive(self.xp_per_level).unwrap_or(defaults.xp_per_level),
            notification_channel_id: self
                .notification_channel_id
                .and_then(|id| u64::try_from(id).ok()),
            embed_color: self
                .embed_color
                .and_then(|color| u32::try_from(color).ok())
                .filter(|color| *color <= 0xFF_FF_FF),
            notification_image: self.notification_image.filter(|url| !url.trim().is_empty()),
            messages: self.messages,
        }
        .sanitized()
    }
}

fn positive(value: Option<i64>) -> Option<u64> {
    value
        .and_then(|raw| u64::try_from(raw).ok())
        .filter(|raw| *raw > 0)
}

/// Load a guild's leveling config with defaults applied.
///
/// A guild without a row gets `GuildLevelingConfig::defaults`.
pub async fn resolve_guild_config(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<GuildLevelingConfig> {
    let cache_key = leveling_config_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let row: Option<LevelingConfigRow> = sqlx::query_as(
                "SELECT xp_per_minute, xp_per_level, notification_channel_id,
                        embed_color, notification_image, messages
                 FROM guild_leveling_config
                 WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?;

            Ok(row.map_or_else(
                || GuildLevelingConfig::defaults(guild_id),
                |row| row.into_config(guild_id),
            ))
        })
        .await
}

pub async fn set_notification_channel(
    db: &Database,
    guild_id: u64,
    channel_id: Option<u64>,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = channel_id
        .map(i64::try_from)
        .transpose()
        .context("channel_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_leveling_config (guild_id, notification_channel_id)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE
         SET notification_channel_id = EXCLUDED.notification_channel_id",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

pub async fn set_rates(
    db: &Database,
    guild_id: u64,
    xp_per_minute: u64,
    xp_per_level: u64,
) -> anyhow::Result<()> {
    anyhow::ensure!(xp_per_minute > 0, "xp_per_minute must be positive");
    anyhow::ensure!(xp_per_level > 0, "xp_per_level must be positive");

    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let per_minute_i64 = i64::try_from(xp_per_minute).context("xp_per_minute out of i64 range")?;
    let per_level_i64 = i64::try_from(xp_per_level).context("xp_per_level out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_leveling_config (guild_id, xp_per_minute, xp_per_level)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id) DO UPDATE SET
             xp_per_minute = EXCLUDED.xp_per_minute,
             xp_per_level = EXCLUDED.xp_per_level",
    )
    .bind(guild_id_i64)
    .bind(per_minute_i64)
    .bind(per_level_i64)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

pub async fn set_embed_color(db: &Database, guild_id: u64, color: Option<u32>) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let color_i32 = color
        .map(|value| i32::try_from(value & 0xFF_FF_FF))
        .transpose()
        .context("embed color out of i32 range")?;

    sqlx::query(
        "INSERT INTO guild_leveling_config (guild_id, embed_color)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET embed_color = EXCLUDED.embed_color",
    )
    .bind(guild_id_i64)
    .bind(color_i32)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

pub async fn set_notification_image(
    db: &Database,
    guild_id: u64,
    image_url: Option<&str>,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_leveling_config (guild_id, notification_image)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET notification_image = EXCLUDED.notification_image",
    )
    .bind(guild_id_i64)
    .bind(image_url)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

pub async fn set_messages(db: &Database, guild_id: u64, messages: &[String]) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_leveling_config (guild_id, messages)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET messages = EXCLUDED.messages",
    )
    .bind(guild_id_i64)
    .bind(messages)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

/// Clear color, image and message templates; rates and channel are kept.
pub async fn reset_style(db: &Database, guild_id: u64) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "UPDATE guild_leveling_config
         SET embed_color = NULL, notification_image = NULL, messages = '{}'
         WHERE guild_id = $1",
    )
    .bind(guild_id_i64)
    .execute(db.pool())
    .await?;

    invalidate_leveling_config(db.cache(), guild_id).await
}

#[cfg(test)]
mod tests {
    use super::LevelingConfigRow;

    fn row() -> LevelingConfigRow {
        LevelingConfigRow {
            xp_per_minute: None,
            xp_per_level: None,
            notification_channel_id: None,
            embed_color: None,
            notification_image: None,
            messages: Vec::new(),
        }
    }

    #[test]
    fn empty_row_uses_defaults() {
        let config = row().into_config(5);
        assert_eq!(config.xp_per_minute, 1);
        assert_eq!(config.xp_per_level, 100);
        assert_eq!(config.notification_channel_id, None);
    }

    #[test]
    fn non_positive_rates_fall_back() {
        let config = LevelingConfigRow {
            xp_per_minute: Some(0),
            xp_per_level: Some(-20),
            ..row()
        }
        .into_config(5);

        assert_eq!(config.xp_per_minute, 1);
        assert_eq!(config.xp_per_level, 100);
    }

    #[test]
    fn stored_values_are_kept() {
        let config = LevelingConfigRow {
            xp_per_minute: Some(3),
            xp_per_level: Some(250),
            notification_channel_id: Some(1234),
            embed_color: Some(0x00_FF_00),
            notification_image: Some("  ".to_owned()),
            messages: vec!["{user} hit {level}".to_owned()],
        }
        .into_config(5);

        assert_eq!(config.xp_per_minute, 3);
        assert_eq!(config.xp_per_level, 250);
        assert_eq!(config.notification_channel_id, Some(1234));
        assert_eq!(config.embed_color, Some(0x00_FF_00));
        assert_eq!(config.notification_image, None);
        assert_eq!(config.messages.len(), 1);
    }
}
