use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

use saphy_commands::leveling::embeds::level_up_embed;
use saphy_database::Database;
use saphy_leveling::{LevelUp, LevelUpNotifier, LevelingStore};

/// Posts level-up announcements to the guild's configured channel, falling
/// back to its system channel.
pub struct DiscordLevelUpNotifier {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    db: Database,
}

impl DiscordLevelUpNotifier {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>, db: Database) -> Self {
        Self { http, cache, db }
    }

    fn system_channel_and_icon(
        &self,
        guild_id: serenity::GuildId,
    ) -> (Option<serenity::ChannelId>, Option<String>) {
        match self.cache.guild(guild_id) {
            Some(guild) => (guild.system_channel_id, guild.icon_url()),
            None => (None, None),
        }
    }
}

#[async_trait]
impl LevelUpNotifier for DiscordLevelUpNotifier {
    async fn notify_level_up(&self, level_up: LevelUp) -> anyhow::Result<()> {
        let guild_id = serenity::GuildId::new(level_up.guild_id);
        let config = self.db.guild_config(level_up.guild_id).await;
        let (system_channel, guild_icon) = self.system_channel_and_icon(guild_id);

        let Some(channel_id) = config
            .notification_channel_id
            .map(serenity::ChannelId::new)
            .or(system_channel)
        else {
            warn!(
                guild_id = level_up.guild_id,
                user_id = level_up.user_id,
                level = level_up.level,
                "no channel for level-up announcement; skipping"
            );
            return Ok(());
        };

        let user = serenity::UserId::new(level_up.user_id)
            .to_user((&self.cache, self.http.as_ref()))
            .await?;

        let embed = level_up_embed(
            &config,
            user.display_name(),
            Some(user.face()),
            guild_icon,
            level_up.level,
        );

        channel_id
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .content(format!("<@{}>", level_up.user_id))
                    .embed(embed),
            )
            .await?;

        debug!(
            guild_id = level_up.guild_id,
            channel_id = channel_id.get(),
            user_id = level_up.user_id,
            level = level_up.level,
            "level-up announced"
        );
        Ok(())
    }
}
