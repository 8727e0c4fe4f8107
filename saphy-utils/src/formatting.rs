const RANK_MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Format an integer with `,` thousands separators (e.g. 12345 -> "12,345").
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Medal for the podium, bold position for everyone else. `rank` is 1-based.
pub fn rank_label(rank: usize) -> String {
    match rank {
        1..=3 => RANK_MEDALS[rank - 1].to_owned(),
        _ => format!("**{}.**", rank),
    }
}

/// Whole percentage of `current / total`, clamped to 0..=100.
pub fn percent(current: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }

    (current.min(total).saturating_mul(100)) / total
}

/// Text progress bar such as `▰▰▰▱▱▱▱▱▱▱`.
pub fn progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = (percent(current, total) as usize * width) / 100;
    let mut bar = "▰".repeat(filled);
    bar.push_str(&"▱".repeat(width.saturating_sub(filled)));
    bar
}

/// Fill the `{user}` and `{level}` placeholders of a level-up template.
pub fn render_level_message(template: &str, user: &str, level: u64) -> String {
    template
        .replace("{user}", user)
        .replace("{level}", &level.to_string())
}
