use crate::CommandMeta;
use crate::leveling::embeds::leaderboard_line;
use saphy_core::{Context, Error};
use saphy_database::model::leveling::UserProgress;
use saphy_utils::embed::DEFAULT_EMBED_COLOR;
use saphy_utils::pagination::{EmbedPage, page_window, paginate_embed_pages, total_pages};

pub const META: CommandMeta = CommandMeta {
    name: "leaderboard",
    desc: "Show the top voice-active members.",
    category: "leveling",
    usage: "!leaderboard [page]",
};

pub const LEADERBOARD_LIMIT: usize = 100;
const ENTRIES_PER_PAGE: usize = 10;

#[poise::command(prefix_command, slash_command, category = "Leveling")]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Starting page"] page: Option<usize>,
) -> Result<(), Error> {
    let entries = ctx.data().voice_xp.leaderboard(LEADERBOARD_LIMIT).await?;
    if entries.is_empty() {
        ctx.say("📊 The leaderboard is currently empty!").await?;
        return Ok(());
    }

    let total = total_pages(entries.len(), ENTRIES_PER_PAGE);
    let requested_page = page.unwrap_or(1);
    if requested_page == 0 || requested_page > total {
        ctx.say(format!(
            "Page {} does not exist. Available pages: 1-{}.",
            requested_page, total
        ))
        .await?;
        return Ok(());
    }

    let footer = format!("Requested by {}", ctx.author().name);
    let pages = build_pages(&entries)
        .into_iter()
        .map(|description| EmbedPage {
            description,
            footer_note: Some(footer.clone()),
        })
        .collect::<Vec<_>>();

    paginate_embed_pages(
        ctx,
        "🏆 Voice Leaderboard",
        DEFAULT_EMBED_COLOR,
        &pages,
        requested_page,
    )
    .await?;
    Ok(())
}

fn build_pages(entries: &[UserProgress]) -> Vec<String> {
    let total = total_pages(entries.len(), ENTRIES_PER_PAGE);

    (1..=total)
        .map(|page| {
            let (start, end) = page_window(entries.len(), ENTRIES_PER_PAGE, page);
            entries[start..end]
                .iter()
                .enumerate()
                .map(|(offset, entry)| leaderboard_line(start + offset + 1, entry))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}
