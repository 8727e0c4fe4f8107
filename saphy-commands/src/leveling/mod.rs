pub mod embeds;
pub mod leaderboard;
pub mod level;
pub mod levelchannel;
pub mod levelrates;
pub mod levelstyle;
