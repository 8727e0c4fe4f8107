use saphy_core::{Context, Error};
use saphy_utils::COMMAND_PREFIX;

use crate::{COMMANDS, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "usage",
    desc: "Show usage syntax for a specific command.",
    category: "utility",
    usage: "!usage <command>",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn usage(
    ctx: Context<'_>,
    #[description = "Command name"] command: Option<String>,
) -> Result<(), Error> {
    let Some(raw_name) = command.as_deref() else {
        ctx.say(format!("Usage: `{}`", META.usage)).await?;
        return Ok(());
    };

    let lookup = lookup_name(raw_name);

    let Some(command) = COMMANDS.iter().find(|command| command.name == lookup) else {
        ctx.say(format!("Unknown command: `{}`", lookup)).await?;
        return Ok(());
    };

    ctx.say(format!("{}\nUsage: `{}`", command.desc, command.usage))
        .await?;
    Ok(())
}

fn lookup_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(COMMAND_PREFIX)
        .trim_start_matches('/')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::lookup_name;

    #[test]
    fn strips_prefixes_and_case() {
        assert_eq!(lookup_name(" !Level "), "level");
        assert_eq!(lookup_name("/leaderboard"), "leaderboard");
        assert_eq!(lookup_name("levelstyle"), "levelstyle");
    }
}
