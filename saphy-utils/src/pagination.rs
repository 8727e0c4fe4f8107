use std::time::Duration;

use poise::serenity_prelude as serenity;
use tracing::debug;

pub const PAGINATION_TIMEOUT_SECS: u64 = 60 * 3;

/// Number of pages needed for `total_items`; never less than one.
pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    total_items.div_ceil(per_page.max(1)).max(1)
}

/// `[start, end)` item range for a 1-based `page`, clamped to the item count.
pub fn page_window(total_items: usize, per_page: usize, page: usize) -> (usize, usize) {
    let per_page = per_page.max(1);
    let start = (page.max(1) - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);
    (start, end)
}

/// One rendered page: an embed description plus optional footer note.
#[derive(Clone, Debug, Default)]
pub struct EmbedPage {
    pub description: String,
    pub footer_note: Option<String>,
}

impl From<String> for EmbedPage {
    fn from(description: String) -> Self {
        Self {
            description,
            footer_note: None,
        }
    }
}

fn page_embed(
    title: &str,
    color: u32,
    page: &EmbedPage,
    index: usize,
    total: usize,
) -> serenity::CreateEmbed {
    let mut footer = if total > 1 {
        format!("Page {}/{}", index + 1, total)
    } else {
        String::new()
    };

    if let Some(note) = page.footer_note.as_deref().filter(|note| !note.is_empty()) {
        if !footer.is_empty() {
            footer.push_str(" • ");
        }
        footer.push_str(note);
    }

    let embed = serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(color)
        .description(page.description.clone());

    if footer.is_empty() {
        embed
    } else {
        embed.footer(serenity::CreateEmbedFooter::new(footer))
    }
}

fn page_buttons(
    prev_id: &str,
    next_id: &str,
    index: usize,
    total: usize,
) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(prev_id)
            .label("Previous")
            .emoji('⬅')
            .style(serenity::ButtonStyle::Secondary)
            .disabled(index == 0),
        serenity::CreateButton::new(next_id)
            .label("Next")
            .emoji('➡')
            .style(serenity::ButtonStyle::Secondary)
            .disabled(index + 1 >= total),
    ])]
}

/// Send `pages` as one embed with Previous/Next buttons for the invoking user.
///
/// `start_page` is 1-based and clamped. Buttons are removed once the
/// collector times out.
pub async fn paginate_embed_pages<U, E>(
    ctx: poise::Context<'_, U, E>,
    title: &str,
    color: u32,
    pages: &[EmbedPage],
    start_page: usize,
) -> Result<(), serenity::Error>
where
    U: Send + Sync,
    E: Send + Sync,
{
    if pages.is_empty() {
        return Ok(());
    }

    let total = pages.len();
    let mut index = start_page.clamp(1, total) - 1;

    if total == 1 {
        ctx.send(poise::CreateReply::default().embed(page_embed(
            title, color, &pages[0], 0, total,
        )))
        .await?;
        return Ok(());
    }

    let ctx_id = ctx.id();
    let prev_id = format!("{ctx_id}_prev");
    let next_id = format!("{ctx_id}_next");

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(page_embed(title, color, &pages[index], index, total))
                .components(page_buttons(&prev_id, &next_id, index, total)),
        )
        .await?;
    let message = reply.message().await?;
    let (message_id, channel_id) = (message.id, message.channel_id);
    let author_id = ctx.author().id;

    while let Some(press) = serenity::collector::ComponentInteractionCollector::new(ctx)
        .message_id(message_id)
        .filter(move |press| press.user.id == author_id)
        .timeout(Duration::from_secs(PAGINATION_TIMEOUT_SECS))
        .await
    {
        if press.data.custom_id == next_id {
            index = (index + 1).min(total - 1);
        } else if press.data.custom_id == prev_id {
            index = index.saturating_sub(1);
        } else {
            continue;
        }

        press
            .create_response(
                ctx.http(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(page_embed(title, color, &pages[index], index, total))
                        .components(page_buttons(&prev_id, &next_id, index, total)),
                ),
            )
            .await?;
    }

    if let Err(source) = channel_id
        .edit_message(
            ctx.http(),
            message_id,
            serenity::EditMessage::new()
                .embed(page_embed(title, color, &pages[index], index, total))
                .components(Vec::new()),
        )
        .await
    {
        debug!(?source, "failed to strip pagination buttons");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{page_window, total_pages};

    #[test]
    fn pages_round_up_and_never_hit_zero() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn windows_are_clamped() {
        assert_eq!(page_window(25, 10, 1), (0, 10));
        assert_eq!(page_window(25, 10, 3), (20, 25));
        assert_eq!(page_window(25, 10, 9), (25, 25));
        assert_eq!(page_window(25, 10, 0), (0, 10));
    }
}
