//! Pure XP and level math. Every function is total for any input; a zero
//! rate or threshold is treated as 1 so callers can't trigger a division by
//! zero, but config is expected to be validated before it gets here.

pub const SECONDS_PER_MINUTE: u64 = 60;

/// XP earned for `seconds` of voice time: one `xp_per_minute` per whole minute.
pub fn xp_for_duration(seconds: u64, xp_per_minute: u64) -> u64 {
    (seconds / SECONDS_PER_MINUTE).saturating_mul(xp_per_minute)
}

/// Level reached at `xp`. Level 1 is the floor.
pub fn level_for_xp(xp: u64, xp_per_level: u64) -> u64 {
    (xp / xp_per_level.max(1)).saturating_add(1)
}

/// `(xp into the current level, xp needed to finish it)`.
pub fn level_progress(xp: u64, xp_per_level: u64) -> (u64, u64) {
    let xp_per_level = xp_per_level.max(1);
    (xp % xp_per_level, xp_per_level)
}

/// Total XP at which `level` starts.
pub fn xp_for_level(level: u64, xp_per_level: u64) -> u64 {
    level.saturating_sub(1).saturating_mul(xp_per_level.max(1))
}
