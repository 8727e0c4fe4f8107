use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use saphy_database::model::leveling::UserProgress;

use crate::arithmetic::{SECONDS_PER_MINUTE, xp_for_duration};
use crate::clock::Clock;
use crate::leaderboard::sort_for_leaderboard;
use crate::session::{SessionRegistry, Transition, VoiceStateChange};
use crate::store::{LevelUp, LevelUpNotifier, LevelingStore};

/// Drives voice sessions and turns their time into persisted XP.
pub struct VoiceXpEngine {
    registry: Mutex<SessionRegistry>,
    store: Arc<dyn LevelingStore>,
    notifier: Arc<dyn LevelUpNotifier>,
    clock: Arc<dyn Clock>,
    period_secs: u64,
}

impl fmt::Debug for VoiceXpEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceXpEngine")
            .field("period_secs", &self.period_secs)
            .finish_non_exhaustive()
    }
}

impl VoiceXpEngine {
    /// `period_secs` is rounded down to whole minutes (at least one), since
    /// XP is only earned per whole minute.
    pub fn new(
        store: Arc<dyn LevelingStore>,
        notifier: Arc<dyn LevelUpNotifier>,
        clock: Arc<dyn Clock>,
        period_secs: u64,
    ) -> Self {
        let period_secs = (period_secs / SECONDS_PER_MINUTE).max(1) * SECONDS_PER_MINUTE;

        Self {
            registry: Mutex::new(SessionRegistry::new(period_secs)),
            store,
            notifier,
            clock,
            period_secs,
        }
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    pub async fn active_sessions(&self) -> usize {
        self.registry.lock().await.len()
    }

    pub async fn on_voice_state_change(&self, event: VoiceStateChange) {
        let (transition, now) = {
            let mut registry = self.registry.lock().await;
            // Read under the lock: a drain may have advanced `last_credit_at`.
            let now = self.clock.now_secs();
            (registry.apply(&event, now), now)
        };

        match transition {
            Transition::Ignored => {}
            Transition::Started { session } => {
                info!(
                    user_id = session.user_id,
                    guild_id = session.guild_id,
                    channel_id = session.channel_id,
                    "voice XP session started"
                );
            }
            Transition::Moved {
                from,
                to,
                owed_ticks,
            } => {
                info!(
                    user_id = to.user_id,
                    guild_id = to.guild_id,
                    from_channel_id = from.channel_id,
                    to_channel_id = to.channel_id,
                    carried_secs = to.carried_secs(),
                    "voice XP session moved"
                );
                self.credit_ticks(to.user_id, to.guild_id, owed_ticks).await;
            }
            Transition::Ended {
                session,
                owed_ticks,
                leftover_secs,
            } => {
                info!(
                    user_id = session.user_id,
                    guild_id = session.guild_id,
                    duration_secs = now.saturating_sub(session.joined_at),
                    leftover_secs,
                    "voice XP session ended"
                );
                self.credit_ticks(session.user_id, session.guild_id, owed_ticks)
                    .await;
                self.credit(session.user_id, session.guild_id, leftover_secs)
                    .await;
            }
            Transition::Stopped {
                session,
                owed_ticks,
            } => {
                info!(
                    user_id = session.user_id,
                    guild_id = session.guild_id,
                    "moved to AFK channel; voice XP stopped"
                );
                self.credit_ticks(session.user_id, session.guild_id, owed_ticks)
                    .await;
            }
        }
    }

    /// Make a guild's sessions match who is actually in voice, e.g. when the
    /// guild becomes available after a reconnect. `present` holds
    /// `(user_id, channel_id)` for eligible members. Returns `(started, dropped)`.
    pub async fn sync_guild_sessions(&self, guild_id: u64, present: &[(u64, u64)]) -> (usize, usize) {
        let mut registry = self.registry.lock().await;
        let now = self.clock.now_secs();

        let present_ids: HashSet<u64> = present.iter().map(|(user_id, _)| *user_id).collect();
        let dropped = registry.retain_guild(guild_id, &present_ids);
        for session in &dropped {
            debug!(
                user_id = session.user_id,
                guild_id,
                "dropping voice session missing after guild sync"
            );
        }

        let started = present
            .iter()
            .filter(|(user_id, channel_id)| registry.resume(*user_id, guild_id, *channel_id, now))
            .count();

        (started, dropped.len())
    }

    /// Stop tracking every session in a guild the bot can no longer see.
    pub async fn drop_guild_sessions(&self, guild_id: u64) -> usize {
        self.registry
            .lock()
            .await
            .retain_guild(guild_id, &HashSet::new())
            .len()
    }

    /// Credit every period that has elapsed. Returns the number of ticks run.
    pub async fn run_due(&self) -> usize {
        let ticks = {
            let mut registry = self.registry.lock().await;
            registry.drain_due(self.clock.now_secs())
        };

        for tick in &ticks {
            self.credit(tick.user_id, tick.guild_id, self.period_secs)
                .await;
        }

        ticks.len()
    }

    /// Poll for due ticks forever. Meant to be spawned once at startup.
    pub async fn run_scheduler(self: Arc<Self>, resolution: Duration) {
        let mut interval = time::interval(resolution);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            period_secs = self.period_secs,
            resolution_ms = resolution.as_millis() as u64,
            "voice XP scheduler started"
        );

        loop {
            interval.tick().await;
            let fired = self.run_due().await;
            if fired > 0 {
                debug!(fired, "voice XP ticks credited");
            }
        }
    }

    pub async fn progress(&self, user_id: u64) -> anyhow::Result<Option<UserProgress>> {
        self.store.progress(user_id).await
    }

    pub async fn leaderboard(&self, limit: usize) -> anyhow::Result<Vec<UserProgress>> {
        let mut entries = self.store.leaderboard(limit).await?;
        sort_for_leaderboard(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn credit_ticks(&self, user_id: u64, guild_id: u64, ticks: u64) {
        for _ in 0..ticks {
            self.credit(user_id, guild_id, self.period_secs).await;
        }
    }

    async fn credit(&self, user_id: u64, guild_id: u64, seconds: u64) {
        let config = self.store.guild_config(guild_id).await;
        let delta = xp_for_duration(seconds, config.xp_per_minute);
        if delta == 0 {
            return;
        }

        let credit = match self
            .store
            .credit_xp(user_id, delta, config.xp_per_level)
            .await
        {
            Ok(credit) => credit,
            Err(source) => {
                error!(
                    ?source,
                    user_id, guild_id, delta, "failed to persist voice XP; credit dropped"
                );
                return;
            }
        };

        debug!(
            user_id,
            guild_id,
            delta,
            xp = credit.progress.xp,
            level = credit.progress.level,
            "voice XP credited"
        );

        if !credit.leveled_up() {
            return;
        }

        let level_up = LevelUp {
            user_id,
            guild_id,
            previous_level: credit.previous_level,
            level: credit.progress.level,
        };
        info!(user_id, guild_id, level = level_up.level, "user leveled up");

        if let Err(source) = self.notifier.notify_level_up(level_up).await {
            warn!(?source, user_id, guild_id, "failed to deliver level-up notification");
        }
    }
}
