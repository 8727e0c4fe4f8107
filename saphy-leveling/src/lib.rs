//! Voice activity XP: session tracking, periodic accrual and level math.

pub mod arithmetic;
pub mod clock;
pub mod engine;
pub mod leaderboard;
pub mod session;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use engine::VoiceXpEngine;
pub use session::{DEFAULT_ACCRUAL_PERIOD_SECS, VoiceStateChange};
pub use store::{LevelUp, LevelUpNotifier, LevelingStore};
