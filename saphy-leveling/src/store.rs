use async_trait::async_trait;
use tracing::warn;

use saphy_database::Database;
use saphy_database::impls::leveling_config::resolve_guild_config;
use saphy_database::impls::progress::{credit_xp, get_leaderboard, get_progress};
use saphy_database::model::leveling::{GuildLevelingConfig, UserProgress, XpCredit};

/// Persistence the engine needs.
#[async_trait]
pub trait LevelingStore: Send + Sync {
    /// Guild config with defaults applied. Never fails: lookup errors are
    /// logged by the implementation and answered with defaults.
    async fn guild_config(&self, guild_id: u64) -> GuildLevelingConfig;

    /// Atomically add `delta` XP and recompute the level.
    async fn credit_xp(&self, user_id: u64, delta: u64, xp_per_level: u64)
    -> anyhow::Result<XpCredit>;

    async fn progress(&self, user_id: u64) -> anyhow::Result<Option<UserProgress>>;

    async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<UserProgress>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelUp {
    pub user_id: u64,
    pub guild_id: u64,
    pub previous_level: u64,
    pub level: u64,
}

/// Delivers level-up announcements. How and where is up to the implementation.
#[async_trait]
pub trait LevelUpNotifier: Send + Sync {
    async fn notify_level_up(&self, level_up: LevelUp) -> anyhow::Result<()>;
}

#[async_trait]
impl LevelingStore for Database {
    async fn guild_config(&self, guild_id: u64) -> GuildLevelingConfig {
        match resolve_guild_config(self, guild_id).await {
            Ok(config) => config,
            Err(source) => {
                warn!(?source, guild_id, "failed to load leveling config; using defaults");
                GuildLevelingConfig::defaults(guild_id)
            }
        }
    }

    async fn credit_xp(
        &self,
        user_id: u64,
        delta: u64,
        xp_per_level: u64,
    ) -> anyhow::Result<XpCredit> {
        credit_xp(self, user_id, delta, xp_per_level).await
    }

    async fn progress(&self, user_id: u64) -> anyhow::Result<Option<UserProgress>> {
        get_progress(self, user_id).await
    }

    async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<UserProgress>> {
        get_leaderboard(self, limit).await
    }
}
