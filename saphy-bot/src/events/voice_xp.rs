use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use saphy_core::Data;
use saphy_leveling::VoiceStateChange;

pub async fn handle_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) {
    let Some(guild_id) = new.guild_id.or_else(|| old.and_then(|state| state.guild_id)) else {
        return;
    };

    let change = VoiceStateChange {
        user_id: new.user_id.get(),
        guild_id: guild_id.get(),
        old_channel_id: old.and_then(|state| state.channel_id).map(|id| id.get()),
        new_channel_id: new.channel_id.map(|id| id.get()),
        afk_channel_id: afk_channel_id(ctx, guild_id),
        is_bot: is_bot(ctx, new),
    };

    if change.is_bot {
        debug!(user_id = change.user_id, "ignoring bot voice state");
        return;
    }

    data.voice_xp.on_voice_state_change(change).await;
}

/// Line up tracked sessions with the guild's voice states when it becomes
/// available. Members already in voice get a session; tracked members who
/// left while the gateway was down are dropped.
pub async fn sync_guild_sessions(data: &Data, guild: &serenity::Guild) {
    let afk = guild
        .afk_metadata
        .as_ref()
        .map(|metadata| metadata.afk_channel_id);

    let present = guild
        .voice_states
        .iter()
        .filter_map(|(user_id, state)| {
            let channel_id = state.channel_id.filter(|channel_id| Some(*channel_id) != afk)?;

            let bot = state
                .member
                .as_ref()
                .map(|member| member.user.bot)
                .or_else(|| guild.members.get(user_id).map(|member| member.user.bot))
                .unwrap_or(false);

            (!bot).then_some((user_id.get(), channel_id.get()))
        })
        .collect::<Vec<_>>();

    let (started, dropped) = data
        .voice_xp
        .sync_guild_sessions(guild.id.get(), &present)
        .await;

    if started > 0 || dropped > 0 {
        info!(guild_id = guild.id.get(), started, dropped, "voice sessions synced");
    }
}

pub async fn drop_guild_sessions(data: &Data, guild_id: serenity::GuildId, unavailable: bool) {
    let dropped = data.voice_xp.drop_guild_sessions(guild_id.get()).await;
    if dropped > 0 {
        info!(
            guild_id = guild_id.get(),
            dropped,
            unavailable,
            "voice sessions dropped for lost guild"
        );
    }
}

fn afk_channel_id(ctx: &serenity::Context, guild_id: serenity::GuildId) -> Option<u64> {
    ctx.cache
        .guild(guild_id)
        .and_then(|guild| guild.afk_metadata.as_ref().map(|metadata| metadata.afk_channel_id.get()))
}

fn is_bot(ctx: &serenity::Context, state: &serenity::VoiceState) -> bool {
    if let Some(member) = &state.member {
        return member.user.bot;
    }

    ctx.cache
        .user(state.user_id)
        .map(|user| user.bot)
        .unwrap_or(false)
}
