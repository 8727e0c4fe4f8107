use crate::CommandMeta;

pub fn unknown_category_message(wanted_category: &str, valid_categories: &[&str]) -> String {
    let valid = valid_categories
        .iter()
        .map(|category| display_category(category))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Unknown category: {}\nValid categories: {}",
        display_category(wanted_category),
        valid
    )
}

pub fn no_commands_message(category: Option<&str>) -> String {
    match category {
        Some(cat) => format!("No commands found in category: {}", display_category(cat)),
        None => "No commands are registered.".to_owned(),
    }
}

pub fn page_out_of_range_message(requested_page: usize, total_pages: usize) -> String {
    format!(
        "Page {} does not exist. Available pages: 1-{}.",
        requested_page, total_pages
    )
}

/// Commands grouped under bold category headers, one entry per command
/// with its description and usage line.
pub fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut out = String::new();
    let mut current_category: Option<&str> = None;

    for command in commands {
        if current_category != Some(command.category) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("**{}**\n", display_category(command.category)));
            current_category = Some(command.category);
        }

        out.push_str(&format!(
            "`{}`: {}\n└ `{}`\n",
            command.name, command.desc, command.usage
        ));
    }

    if out.is_empty() {
        out.push_str("No commands available.");
    }

    out.trim_end().to_owned()
}

fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{grouped_help_description, unknown_category_message};
    use crate::CommandMeta;

    const LEVEL: CommandMeta = CommandMeta {
        name: "level",
        desc: "Show a level.",
        category: "leveling",
        usage: "!level [user]",
    };
    const PING: CommandMeta = CommandMeta {
        name: "ping",
        desc: "Pong.",
        category: "utility",
        usage: "!ping",
    };

    #[test]
    fn groups_by_category_header() {
        let text = grouped_help_description(&[&LEVEL, &PING]);
        assert_eq!(
            text,
            "**Leveling**\n`level`: Show a level.\n└ `!level [user]`\n\n**Utility**\n`ping`: Pong.\n└ `!ping`"
        );
    }

    #[test]
    fn empty_listing() {
        assert_eq!(grouped_help_description(&[]), "No commands available.");
    }

    #[test]
    fn unknown_category_lists_valid_ones() {
        assert_eq!(
            unknown_category_message("music", &["leveling", "utility"]),
            "Unknown category: Music\nValid categories: Leveling, Utility"
        );
    }
}
