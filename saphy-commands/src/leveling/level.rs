use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::leveling::embeds::{
    guild_only_message, no_activity_message, profile_description, profile_embed,
};
use saphy_core::{Context, Error};
use saphy_database::impls::progress::get_rank;
use saphy_leveling::LevelingStore;

pub const META: CommandMeta = CommandMeta {
    name: "level",
    desc: "Show voice level, XP and progress to the next level.",
    category: "leveling",
    usage: "!level [user]",
};

#[poise::command(prefix_command, slash_command, category = "Leveling")]
pub async fn level(
    ctx: Context<'_>,
    #[description = "Member to look up (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    if target.bot {
        ctx.say("Bots don't earn voice XP.").await?;
        return Ok(());
    }

    let data = ctx.data();
    let Some(progress) = data.voice_xp.progress(target.id.get()).await? else {
        ctx.say(no_activity_message(target.display_name())).await?;
        return Ok(());
    };

    let config = data.db.guild_config(guild_id.get()).await;
    let rank = get_rank(&data.db, target.id.get()).await?;

    let description = profile_description(&progress, config.xp_per_level, rank);
    ctx.send(poise::CreateReply::default().embed(profile_embed(
        target.display_name(),
        Some(target.face()),
        description,
    )))
    .await?;

    Ok(())
}
