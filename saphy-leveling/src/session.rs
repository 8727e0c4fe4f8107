//! In-memory voice sessions and the accrual schedule.
//!
//! The registry is plain synchronous state. The engine mutates it under one
//! lock and only starts I/O once the returned [`Transition`] or ticks are in
//! hand, so a voice event and a scheduler pass never interleave halfway.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

pub const DEFAULT_ACCRUAL_PERIOD_SECS: u64 = 60;

/// One voice state change as seen by the leveling engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceStateChange {
    pub user_id: u64,
    pub guild_id: u64,
    pub old_channel_id: Option<u64>,
    pub new_channel_id: Option<u64>,
    pub afk_channel_id: Option<u64>,
    pub is_bot: bool,
}

impl VoiceStateChange {
    fn is_afk(&self, channel_id: u64) -> bool {
        self.afk_channel_id == Some(channel_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceSession {
    pub user_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub joined_at: u64,
    last_credit_at: u64,
    carried_secs: u64,
    generation: u64,
}

impl VoiceSession {
    /// Start of the time not yet converted by a tick.
    pub fn last_credit_at(&self) -> u64 {
        self.last_credit_at
    }

    /// Sub-period remainder brought over from channels left by moving.
    pub fn carried_secs(&self) -> u64 {
        self.carried_secs
    }

    /// Split the uncredited time into whole periods and a remainder.
    fn settle(&self, now: u64, period: u64) -> (u64, u64) {
        let pending = now.saturating_sub(self.last_credit_at);
        (pending / period, pending % period)
    }
}

/// What a voice event did to the registry, and what the caller still owes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Started {
        session: VoiceSession,
    },
    /// Moved between two non-AFK channels.
    Moved {
        from: VoiceSession,
        to: VoiceSession,
        owed_ticks: u64,
    },
    /// Left voice entirely.
    Ended {
        session: VoiceSession,
        owed_ticks: u64,
        leftover_secs: u64,
    },
    /// Moved into the AFK channel. The remainder is dropped.
    Stopped {
        session: VoiceSession,
        owed_ticks: u64,
    },
}

/// A period that elapsed for a user and must be credited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccrualTick {
    pub user_id: u64,
    pub guild_id: u64,
    pub fire_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledTick {
    fire_at: u64,
    user_id: u64,
    generation: u64,
}

#[derive(Debug)]
pub struct SessionRegistry {
    period_secs: u64,
    sessions: HashMap<u64, VoiceSession>,
    // Entries whose generation no longer matches a live session are skipped
    // when popped; cancelling never has to search the heap.
    queue: BinaryHeap<Reverse<ScheduledTick>>,
    next_generation: u64,
}

impl SessionRegistry {
    pub fn new(period_secs: u64) -> Self {
        Self {
            period_secs: period_secs.max(1),
            sessions: HashMap::new(),
            queue: BinaryHeap::new(),
            next_generation: 0,
        }
    }

    pub fn session(&self, user_id: u64) -> Option<&VoiceSession> {
        self.sessions.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Earliest pending fire time, including stale entries.
    pub fn next_fire_at(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(next)| next.fire_at)
    }

    pub fn apply(&mut self, event: &VoiceStateChange, now: u64) -> Transition {
        if event.is_bot {
            return Transition::Ignored;
        }

        // Mute, deafen and stream toggles re-send the same channel.
        if event.old_channel_id.is_some() && event.old_channel_id == event.new_channel_id {
            return Transition::Ignored;
        }

        let Some(new_channel_id) = event.new_channel_id else {
            let Some(session) = self.cancel(event.user_id) else {
                return Transition::Ignored;
            };
            let (owed_ticks, remainder) = session.settle(now, self.period_secs);
            return Transition::Ended {
                leftover_secs: session.carried_secs.saturating_add(remainder),
                owed_ticks,
                session,
            };
        };

        if event.is_afk(new_channel_id) {
            let Some(session) = self.cancel(event.user_id) else {
                return Transition::Ignored;
            };
            let (owed_ticks, _) = session.settle(now, self.period_secs);
            return Transition::Stopped {
                session,
                owed_ticks,
            };
        }

        if let Some(current) = self.sessions.get(&event.user_id)
            && current.channel_id == new_channel_id
        {
            return Transition::Ignored;
        }

        match self.cancel(event.user_id) {
            Some(from) => {
                let (owed_ticks, remainder) = from.settle(now, self.period_secs);
                // Carried time never exceeds one period; whole periods are owed now.
                let carried = from.carried_secs.saturating_add(remainder);
                let owed_ticks = owed_ticks.saturating_add(carried / self.period_secs);
                let carried = carried % self.period_secs;
                let to = self.start(event.user_id, event.guild_id, new_channel_id, now, carried);
                Transition::Moved {
                    from,
                    to,
                    owed_ticks,
                }
            }
            None => Transition::Started {
                session: self.start(event.user_id, event.guild_id, new_channel_id, now, 0),
            },
        }
    }

    /// Start tracking a user found in voice at startup. No-op if already tracked.
    pub fn resume(&mut self, user_id: u64, guild_id: u64, channel_id: u64, now: u64) -> bool {
        if self.sessions.contains_key(&user_id) {
            return false;
        }

        self.start(user_id, guild_id, channel_id, now, 0);
        true
    }

    /// Drop the guild's sessions for users not in `present`. Their queued
    /// ticks go stale and are skipped.
    pub fn retain_guild(&mut self, guild_id: u64, present: &HashSet<u64>) -> Vec<VoiceSession> {
        let stale: Vec<u64> = self
            .sessions
            .values()
            .filter(|session| session.guild_id == guild_id && !present.contains(&session.user_id))
            .map(|session| session.user_id)
            .collect();

        stale
            .into_iter()
            .filter_map(|user_id| self.cancel(user_id))
            .collect()
    }

    /// Pop every period that has elapsed by `now`, rescheduling each session.
    ///
    /// A session that is several periods behind yields one tick per period.
    pub fn drain_due(&mut self, now: u64) -> Vec<AccrualTick> {
        let mut due = Vec::new();

        while let Some(Reverse(next)) = self.queue.peek().copied() {
            if next.fire_at > now {
                break;
            }
            self.queue.pop();

            let Some(session) = self.sessions.get_mut(&next.user_id) else {
                continue;
            };
            if session.generation != next.generation {
                continue;
            }

            session.last_credit_at = next.fire_at;
            due.push(AccrualTick {
                user_id: session.user_id,
                guild_id: session.guild_id,
                fire_at: next.fire_at,
            });

            self.queue.push(Reverse(ScheduledTick {
                fire_at: next.fire_at.saturating_add(self.period_secs),
                ..next
            }));
        }

        due
    }

    fn start(
        &mut self,
        user_id: u64,
        guild_id: u64,
        channel_id: u64,
        now: u64,
        carried_secs: u64,
    ) -> VoiceSession {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);

        let session = VoiceSession {
            user_id,
            guild_id,
            channel_id,
            joined_at: now,
            last_credit_at: now,
            carried_secs,
            generation,
        };

        self.queue.push(Reverse(ScheduledTick {
            fire_at: now.saturating_add(self.period_secs),
            user_id,
            generation,
        }));
        self.sessions.insert(user_id, session.clone());
        debug!(user_id, guild_id, channel_id, "voice session started");

        session
    }

    fn cancel(&mut self, user_id: u64) -> Option<VoiceSession> {
        let session = self.sessions.remove(&user_id)?;
        debug!(
            user_id,
            channel_id = session.channel_id,
            "voice session cancelled"
        );
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{SessionRegistry, Transition, VoiceStateChange};

    const USER: u64 = 10;
    const GUILD: u64 = 1;
    const CHANNEL_A: u64 = 100;
    const CHANNEL_B: u64 = 200;
    const AFK: u64 = 999;

    fn change(old: Option<u64>, new: Option<u64>) -> VoiceStateChange {
        VoiceStateChange {
            user_id: USER,
            guild_id: GUILD,
            old_channel_id: old,
            new_channel_id: new,
            afk_channel_id: Some(AFK),
            is_bot: false,
        }
    }

    #[test]
    fn join_starts_session_and_schedules_first_tick() {
        let mut registry = SessionRegistry::new(60);
        let transition = registry.apply(&change(None, Some(CHANNEL_A)), 0);

        assert!(matches!(transition, Transition::Started { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_fire_at(), Some(60));
        assert!(registry.drain_due(59).is_empty());
        assert_eq!(registry.drain_due(60).len(), 1);
    }

    #[test]
    fn bots_and_afk_joins_are_ignored() {
        let mut registry = SessionRegistry::new(60);

        let bot = VoiceStateChange {
            is_bot: true,
            ..change(None, Some(CHANNEL_A))
        };
        assert_eq!(registry.apply(&bot, 0), Transition::Ignored);
        assert_eq!(registry.apply(&change(None, Some(AFK)), 0), Transition::Ignored);
        assert!(registry.is_empty());
        assert!(registry.drain_due(10_000).is_empty());
    }

    #[test]
    fn leave_reports_leftover_after_ticks() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);
        assert_eq!(registry.drain_due(130).len(), 2);

        let transition = registry.apply(&change(Some(CHANNEL_A), None), 150);
        match transition {
            Transition::Ended {
                owed_ticks,
                leftover_secs,
                ..
            } => {
                assert_eq!(owed_ticks, 0);
                assert_eq!(leftover_secs, 30);
            }
            other => panic!("unexpected transition: {other:?}"),
        }
        assert!(registry.is_empty());
        assert!(registry.drain_due(10_000).is_empty());
    }

    #[test]
    fn leave_before_scheduler_runs_owes_whole_periods() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);

        match registry.apply(&change(Some(CHANNEL_A), None), 6000) {
            Transition::Ended {
                owed_ticks,
                leftover_secs,
                ..
            } => {
                assert_eq!(owed_ticks, 100);
                assert_eq!(leftover_secs, 0);
            }
            other => panic!("unexpected transition: {other:?}"),
        }
    }

    #[test]
    fn move_restarts_timer_and_carries_remainder() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);
        assert_eq!(registry.drain_due(90).len(), 1);

        match registry.apply(&change(Some(CHANNEL_A), Some(CHANNEL_B)), 90) {
            Transition::Moved { to, owed_ticks, .. } => {
                assert_eq!(owed_ticks, 0);
                assert_eq!(to.channel_id, CHANNEL_B);
                assert_eq!(to.joined_at, 90);
                assert_eq!(to.carried_secs(), 30);
            }
            other => panic!("unexpected transition: {other:?}"),
        }

        // The old schedule entry at t=120 is dead; the new one fires at t=150.
        assert!(registry.drain_due(149).is_empty());
        assert_eq!(registry.drain_due(150).len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn carried_time_rolls_into_owed_ticks() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);

        let mut owed = 0;
        let mut channels = [CHANNEL_A, CHANNEL_B];
        for hop in 1..=6u64 {
            match registry.apply(&change(Some(channels[0]), Some(channels[1])), hop * 50) {
                Transition::Moved { to, owed_ticks, .. } => {
                    owed += owed_ticks;
                    assert!(to.carried_secs() < 60);
                }
                other => panic!("unexpected transition: {other:?}"),
            }
            channels.swap(0, 1);
        }

        // 300 s in voice, no scheduler pass: five whole periods owed, nothing carried.
        assert_eq!(owed, 5);
        assert_eq!(registry.session(USER).map(|s| s.carried_secs()), Some(0));
    }

    #[test]
    fn move_into_afk_stops_without_remainder() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);
        assert_eq!(registry.drain_due(60).len(), 1);

        match registry.apply(&change(Some(CHANNEL_A), Some(AFK)), 100) {
            Transition::Stopped { owed_ticks, .. } => assert_eq!(owed_ticks, 0),
            other => panic!("unexpected transition: {other:?}"),
        }
        assert!(registry.is_empty());

        // Leaving from AFK afterwards does nothing.
        assert_eq!(
            registry.apply(&change(Some(AFK), None), 500),
            Transition::Ignored
        );
    }

    #[test]
    fn move_out_of_afk_starts_session() {
        let mut registry = SessionRegistry::new(60);
        let transition = registry.apply(&change(Some(AFK), Some(CHANNEL_A)), 10);

        assert!(matches!(transition, Transition::Started { .. }));
        assert_eq!(registry.session(USER).map(|s| s.joined_at), Some(10));
    }

    #[test]
    fn same_channel_updates_are_ignored() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);

        assert_eq!(
            registry.apply(&change(Some(CHANNEL_A), Some(CHANNEL_A)), 30),
            Transition::Ignored
        );
        assert_eq!(registry.session(USER).map(|s| s.joined_at), Some(0));
    }

    #[test]
    fn only_one_live_schedule_entry_per_user() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);
        registry.apply(&change(Some(CHANNEL_A), Some(CHANNEL_B)), 10);
        registry.apply(&change(Some(CHANNEL_B), Some(CHANNEL_A)), 20);

        let ticks = registry.drain_due(200);
        let fire_times: Vec<u64> = ticks.iter().map(|tick| tick.fire_at).collect();
        assert_eq!(fire_times, vec![80, 140, 200]);
    }

    #[test]
    fn overdue_sessions_fire_once_per_period() {
        let mut registry = SessionRegistry::new(60);
        registry.apply(&change(None, Some(CHANNEL_A)), 0);

        let ticks = registry.drain_due(185);
        assert_eq!(ticks.len(), 3);
        assert_eq!(registry.session(USER).map(|s| s.last_credit_at()), Some(180));
    }

    #[test]
    fn resume_only_starts_untracked_users() {
        let mut registry = SessionRegistry::new(60);
        assert!(registry.resume(USER, GUILD, CHANNEL_A, 0));
        assert!(!registry.resume(USER, GUILD, CHANNEL_B, 5));
        assert_eq!(registry.session(USER).map(|s| s.channel_id), Some(CHANNEL_A));
    }

    #[test]
    fn retain_guild_drops_absent_users_only() {
        const OTHER_USER: u64 = 11;
        const OTHER_GUILD: u64 = 2;

        let mut registry = SessionRegistry::new(60);
        registry.resume(USER, GUILD, CHANNEL_A, 0);
        registry.resume(OTHER_USER, GUILD, CHANNEL_B, 0);
        registry.resume(12, OTHER_GUILD, CHANNEL_A, 0);

        let dropped = registry.retain_guild(GUILD, &HashSet::from([OTHER_USER]));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].user_id, USER);
        assert!(registry.session(USER).is_none());
        assert_eq!(registry.len(), 2);

        // Only the two remaining sessions keep firing.
        let ticks = registry.drain_due(60);
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|tick| tick.user_id != USER));

        registry.retain_guild(OTHER_GUILD, &HashSet::new());
        assert_eq!(registry.len(), 1);
        assert!(registry.drain_due(10_000).iter().all(|tick| tick.user_id == OTHER_USER));
    }
}
