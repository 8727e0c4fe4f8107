pub mod level_up;
pub mod voice_xp;
