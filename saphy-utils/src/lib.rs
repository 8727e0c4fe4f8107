/// Embed colors and builders shared across commands.
pub mod embed;
/// Number, rank and template formatting.
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Button pagination for embed pages.
pub mod pagination;
/// Pure parser helpers.
pub mod parse;
