use std::sync::Arc;

use saphy_database::Database;
use saphy_leveling::VoiceXpEngine;

pub type Error = anyhow::Error;

/// State shared by every command and event handler.
#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub voice_xp: Arc<VoiceXpEngine>,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
