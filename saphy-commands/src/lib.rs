pub mod leveling;
pub mod utility;

use saphy_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    utility::usage::META,
    leveling::level::META,
    leveling::leaderboard::META,
    leveling::levelchannel::META,
    leveling::levelrates::META,
    leveling::levelstyle::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        utility::usage::usage(),
        leveling::level::level(),
        leveling::leaderboard::leaderboard(),
        leveling::levelchannel::levelchannel(),
        leveling::levelrates::levelrates(),
        leveling::levelstyle::levelstyle(),
    ]
}

#[cfg(test)]
mod tests {
    use super::{COMMANDS, commands};

    #[test]
    fn every_command_has_metadata() {
        let registered = commands();
        assert_eq!(registered.len(), COMMANDS.len());

        for command in &registered {
            assert!(
                COMMANDS.iter().any(|meta| meta.name == command.name),
                "missing META for `{}`",
                command.name
            );
        }
    }

    #[test]
    fn usage_lines_use_the_prefix() {
        for meta in COMMANDS {
            assert!(meta.usage.starts_with(saphy_utils::COMMAND_PREFIX));
            assert!(meta.usage[1..].starts_with(meta.name));
        }
    }
}
