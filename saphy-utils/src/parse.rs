/// Maximum number of level-up message templates a guild can store.
pub const MAX_MESSAGE_TEMPLATES: usize = 10;

/// Parse a raw channel id or a `<#id>` mention.
pub fn parse_channel_id(raw: &str) -> Option<u64> {
    let value = raw.trim();
    let id = value
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(value);

    id.parse::<u64>().ok().filter(|id| *id > 0)
}

/// Parse a `#rrggbb` / `rrggbb` / `0xrrggbb` color.
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let value = raw.trim();
    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .unwrap_or(value);

    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(hex, 16).ok()
}

pub fn format_hex_color(color: u32) -> String {
    format!("#{:06X}", color & 0xFF_FF_FF)
}

/// Split `|`-separated templates, dropping blanks and capping the count.
pub fn parse_message_templates(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .take(MAX_MESSAGE_TEMPLATES)
        .map(str::to_owned)
        .collect()
}

/// Accept only http(s) URLs for notification images.
pub fn parse_image_url(raw: &str) -> Option<&str> {
    let value = raw.trim();
    let has_scheme = value.starts_with("https://") || value.starts_with("http://");
    (has_scheme && !value.contains(char::is_whitespace)).then_some(value)
}
