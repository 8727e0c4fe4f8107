use crate::CommandMeta;
use crate::leveling::embeds::{guild_only_message, level_up_embed, usage_message};
use saphy_core::{Context, Error};
use saphy_database::impls::leveling_config::{
    reset_style, set_embed_color, set_messages, set_notification_image,
};
use saphy_database::model::leveling::GuildLevelingConfig;
use saphy_leveling::LevelingStore;
use saphy_utils::embed::{LEVEL_UP_EMBED_COLOR, error_embed, success_embed};
use saphy_utils::parse::{
    MAX_MESSAGE_TEMPLATES, format_hex_color, parse_hex_color, parse_image_url,
    parse_message_templates,
};
use tracing::info;

pub const META: CommandMeta = CommandMeta {
    name: "levelstyle",
    desc: "Customize the level-up announcement embed.",
    category: "leveling",
    usage: "!levelstyle <show|color|image|messages|reset> [value]",
};

const PREVIEW_LEVEL: u64 = 5;

#[derive(Debug, PartialEq, Eq)]
enum StyleAction {
    Show,
    Color(Option<u32>),
    Image(Option<String>),
    Messages(Vec<String>),
    Reset,
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    category = "Leveling"
)]
pub async fn levelstyle(
    ctx: Context<'_>,
    #[description = "show, color, image, messages or reset"] action: String,
    #[description = "Hex color, image URL, or messages separated by |"]
    #[rest]
    value: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };
    let db = &ctx.data().db;

    let action = match parse_action(&action, value.as_deref()) {
        Ok(action) => action,
        Err(reason) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(error_embed(reason))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let confirmation = match action {
        StyleAction::Show => {
            let config = db.guild_config(guild_id.get()).await;
            let guild_icon = ctx.guild().and_then(|guild| guild.icon_url());
            let author = ctx.author();
            let preview = level_up_embed(
                &config,
                author.display_name(),
                Some(author.face()),
                guild_icon,
                PREVIEW_LEVEL,
            );

            ctx.send(
                poise::CreateReply::default()
                    .content(style_summary(&config))
                    .embed(preview),
            )
            .await?;
            return Ok(());
        }
        StyleAction::Color(color) => {
            set_embed_color(db, guild_id.get(), color).await?;
            match color {
                Some(color) => format!("Level-up color set to `{}`.", format_hex_color(color)),
                None => "Level-up color reset to the default.".to_owned(),
            }
        }
        StyleAction::Image(url) => {
            set_notification_image(db, guild_id.get(), url.as_deref()).await?;
            match url {
                Some(_) => "Level-up image updated.".to_owned(),
                None => "Level-up image cleared.".to_owned(),
            }
        }
        StyleAction::Messages(messages) => {
            set_messages(db, guild_id.get(), &messages).await?;
            if messages.is_empty() {
                "Level-up messages reset to the built-in ones.".to_owned()
            } else {
                format!("Saved {} level-up message(s).", messages.len())
            }
        }
        StyleAction::Reset => {
            reset_style(db, guild_id.get()).await?;
            "Level-up style reset to the defaults.".to_owned()
        }
    };

    info!(guild_id = guild_id.get(), "level-up style updated");
    ctx.send(poise::CreateReply::default().embed(success_embed(confirmation)))
        .await?;
    Ok(())
}

fn parse_action(action: &str, value: Option<&str>) -> Result<StyleAction, String> {
    let value = value.map(str::trim).filter(|value| !value.is_empty());
    let is_clear = value.is_some_and(|value| value.eq_ignore_ascii_case("clear"));

    match action.trim().to_ascii_lowercase().as_str() {
        "show" => Ok(StyleAction::Show),
        "reset" => Ok(StyleAction::Reset),
        "color" | "colour" => match value {
            None => Err(usage_message("!levelstyle color <#rrggbb|clear>")),
            Some(_) if is_clear => Ok(StyleAction::Color(None)),
            Some(raw) => parse_hex_color(raw)
                .map(|color| StyleAction::Color(Some(color)))
                .ok_or_else(|| format!("`{}` is not a hex color like `#00FF00`.", raw)),
        },
        "image" => match value {
            None => Err(usage_message("!levelstyle image <url|clear>")),
            Some(_) if is_clear => Ok(StyleAction::Image(None)),
            Some(raw) => parse_image_url(raw)
                .map(|url| StyleAction::Image(Some(url.to_owned())))
                .ok_or_else(|| "Provide an http(s) image URL, or `clear`.".to_owned()),
        },
        "messages" => match value {
            None => Err(usage_message(
                "!levelstyle messages <message 1|message 2|...|clear>",
            )),
            Some(_) if is_clear => Ok(StyleAction::Messages(Vec::new())),
            Some(raw) => {
                let messages = parse_message_templates(raw);
                if messages.is_empty() {
                    Err("Provide at least one message. Use {user} and {level} as placeholders."
                        .to_owned())
                } else {
                    Ok(StyleAction::Messages(messages))
                }
            }
        },
        other => Err(format!(
            "Unknown action `{}`. {}",
            other,
            usage_message(META.usage)
        )),
    }
}

fn style_summary(config: &GuildLevelingConfig) -> String {
    let color = config.embed_color.unwrap_or(LEVEL_UP_EMBED_COLOR);
    let image = config.notification_image.as_deref().unwrap_or("server icon");
    let messages = if config.messages.is_empty() {
        "built-in".to_owned()
    } else {
        format!("{}/{} custom", config.messages.len(), MAX_MESSAGE_TEMPLATES)
    };

    format!(
        "**Color:** `{}`\n**Image:** {}\n**Messages:** {}\nPreview:",
        format_hex_color(color),
        image,
        messages
    )
}

#[cfg(test)]
mod tests {
    use super::{StyleAction, parse_action, style_summary};
    use saphy_database::model::leveling::GuildLevelingConfig;

    #[test]
    fn colors_parse_or_clear() {
        assert_eq!(
            parse_action("color", Some("#112233")),
            Ok(StyleAction::Color(Some(0x11_22_33)))
        );
        assert_eq!(parse_action("Color", Some("clear")), Ok(StyleAction::Color(None)));
        assert!(parse_action("color", Some("blue")).is_err());
        assert!(parse_action("color", None).is_err());
    }

    #[test]
    fn images_need_a_url() {
        assert_eq!(
            parse_action("image", Some("https://cdn.example/lvl.png")),
            Ok(StyleAction::Image(Some("https://cdn.example/lvl.png".to_owned())))
        );
        assert!(parse_action("image", Some("ftp://nope")).is_err());
    }

    #[test]
    fn messages_are_split() {
        assert_eq!(
            parse_action("messages", Some("GG {user}|{user} hit {level}")),
            Ok(StyleAction::Messages(vec![
                "GG {user}".to_owned(),
                "{user} hit {level}".to_owned(),
            ]))
        );
        assert_eq!(
            parse_action("messages", Some("clear")),
            Ok(StyleAction::Messages(Vec::new()))
        );
        assert!(parse_action("messages", Some(" | ")).is_err());
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert_eq!(parse_action("show", None), Ok(StyleAction::Show));
        assert_eq!(parse_action("reset", Some("ignored")), Ok(StyleAction::Reset));
        assert!(parse_action("font", None).is_err());
    }

    #[test]
    fn summary_reports_defaults() {
        let summary = style_summary(&GuildLevelingConfig::defaults(1));
        assert!(summary.contains("`#00FF00`"));
        assert!(summary.contains("built-in"));
    }
}
