use crate::CommandMeta;
use crate::leveling::embeds::guild_only_message;
use saphy_core::{Context, Error};
use saphy_database::impls::leveling_config::set_notification_channel;
use saphy_leveling::LevelingStore;
use saphy_utils::parse::parse_channel_id;
use tracing::info;

pub const META: CommandMeta = CommandMeta {
    name: "levelchannel",
    desc: "Set or view the channel for level-up announcements.",
    category: "leveling",
    usage: "!levelchannel [#channel|channel_id|clear]",
};

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    category = "Leveling"
)]
pub async fn levelchannel(
    ctx: Context<'_>,
    #[description = "Channel mention/id, or 'clear'"]
    #[rest]
    input: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };
    let db = &ctx.data().db;

    if let Some(input) = input
        .as_deref()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
    {
        if input.eq_ignore_ascii_case("clear") {
            set_notification_channel(db, guild_id.get(), None).await?;
            info!(guild_id = guild_id.get(), "level-up channel cleared");
            ctx.say("Level-up channel cleared. Announcements go to the system channel.")
                .await?;
            return Ok(());
        }

        if let Some(channel_id) = parse_channel_id(input) {
            set_notification_channel(db, guild_id.get(), Some(channel_id)).await?;
            info!(guild_id = guild_id.get(), channel_id, "level-up channel set");
            ctx.say(format!("Level-up channel set to <#{}>.", channel_id))
                .await?;
            return Ok(());
        }

        ctx.say("Provide a valid channel mention/id, or `clear`.")
            .await?;
        return Ok(());
    }

    let config = db.guild_config(guild_id.get()).await;
    match config.notification_channel_id {
        Some(channel_id) => {
            ctx.say(format!("Current level-up channel: <#{}>", channel_id))
                .await?;
        }
        None => {
            ctx.say("No level-up channel configured. Announcements go to the system channel.")
                .await?;
        }
    }

    Ok(())
}
