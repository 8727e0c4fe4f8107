pub mod leveling_config;
pub mod progress;
