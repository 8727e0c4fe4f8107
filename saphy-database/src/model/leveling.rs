use serde::{Deserialize, Serialize};

pub const DEFAULT_XP_PER_MINUTE: u64 = 1;
pub const DEFAULT_XP_PER_LEVEL: u64 = 100;

/// Persisted voice progress for one user. Global across guilds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: u64,
    pub xp: u64,
    pub level: u64,
}

impl UserProgress {
    /// Fresh record for a user who has never earned XP.
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            xp: 0,
            level: 1,
        }
    }
}

/// Result of crediting XP: the record after the update and the level it had before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XpCredit {
    pub previous_level: u64,
    pub progress: UserProgress,
}

impl XpCredit {
    /// Credit result for a record that already includes `delta`. The level
    /// before is computed from `xp - delta` at the same threshold.
    pub fn after_adding(progress: UserProgress, delta: u64, xp_per_level: u64) -> Self {
        let previous_xp = progress.xp.saturating_sub(delta);
        let previous_level = (previous_xp / xp_per_level.max(1)).saturating_add(1);

        Self {
            previous_level: previous_level.min(progress.level),
            progress,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.progress.level > self.previous_level
    }
}

/// Per-guild leveling settings with defaults already applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildLevelingConfig {
    pub guild_id: u64,
    pub xp_per_minute: u64,
    pub xp_per_level: u64,
    pub notification_channel_id: Option<u64>,
    pub embed_color: Option<u32>,
    pub notification_image: Option<String>,
    pub messages: Vec<String>,
}

impl GuildLevelingConfig {
    pub fn defaults(guild_id: u64) -> Self {
        Self {
            guild_id,
            xp_per_minute: DEFAULT_XP_PER_MINUTE,
            xp_per_level: DEFAULT_XP_PER_LEVEL,
            notification_channel_id: None,
            embed_color: None,
            notification_image: None,
            messages: Vec::new(),
        }
    }

    /// Replace non-positive rates with the defaults.
    pub fn sanitized(mut self) -> Self {
        if self.xp_per_minute == 0 {
            self.xp_per_minute = DEFAULT_XP_PER_MINUTE;
        }
        if self.xp_per_level == 0 {
            self.xp_per_level = DEFAULT_XP_PER_LEVEL;
        }
        self.messages.retain(|message| !message.trim().is_empty());
        self
    }
}
