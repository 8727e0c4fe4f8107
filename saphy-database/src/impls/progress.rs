use anyhow::Context as _;

use crate::database::Database;
use crate::model::leveling::{UserProgress, XpCredit};

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: i64,
    xp: i64,
    level: i64,
}

impl TryFrom<ProgressRow> for UserProgress {
    type Error = anyhow::Error;

    fn try_from(row: ProgressRow) -> anyhow::Result<Self> {
        Ok(Self {
            user_id: u64::try_from(row.user_id).context("user_id row out of u64 range")?,
            xp: u64::try_from(row.xp).context("xp row out of u64 range")?,
            level: u64::try_from(row.level).context("level row out of u64 range")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CreditRow {
    xp: i64,
    level: i64,
}

/// Add `delta` XP to a user and recompute their level in one statement.
///
/// Missing users are created at `xp = 0, level = 1` before the delta is
/// applied. The previous level is derived from the returned row, so each
/// credit only reports the threshold it crossed itself.
pub async fn credit_xp(
    db: &Database,
    user_id: u64,
    delta: u64,
    xp_per_level: u64,
) -> anyhow::Result<XpCredit> {
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;
    let delta_i64 = i64::try_from(delta).context("xp delta out of i64 range")?;
    let xp_per_level_i64 = i64::try_from(xp_per_level.max(1)).context("xp_per_level out of i64 range")?;

    let row: CreditRow = sqlx::query_as(
        "INSERT INTO user_progress (user_id, xp, level)
         VALUES ($1, $2, $2 / $3 + 1)
         ON CONFLICT (user_id) DO UPDATE SET
             xp = user_progress.xp + EXCLUDED.xp,
             level = (user_progress.xp + EXCLUDED.xp) / $3 + 1,
             updated_at = NOW()
         RETURNING xp, level",
    )
    .bind(user_id_i64)
    .bind(delta_i64)
    .bind(xp_per_level_i64)
    .fetch_one(db.pool())
    .await?;

    let progress = UserProgress {
        user_id,
        xp: u64::try_from(row.xp).context("xp row out of u64 range")?,
        level: u64::try_from(row.level).context("level row out of u64 range")?,
    };

    Ok(XpCredit::after_adding(progress, delta, xp_per_level))
}

pub async fn get_progress(db: &Database, user_id: u64) -> anyhow::Result<Option<UserProgress>> {
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let row: Option<ProgressRow> =
        sqlx::query_as("SELECT user_id, xp, level FROM user_progress WHERE user_id = $1")
            .bind(user_id_i64)
            .fetch_optional(db.pool())
            .await?;

    row.map(UserProgress::try_from).transpose()
}

/// Top `limit` users by level, then XP.
pub async fn get_leaderboard(db: &Database, limit: usize) -> anyhow::Result<Vec<UserProgress>> {
    let limit_i64 = i64::try_from(limit).context("leaderboard limit out of i64 range")?;

    let rows: Vec<ProgressRow> = sqlx::query_as(
        "SELECT user_id, xp, level
         FROM user_progress
         ORDER BY level DESC, xp DESC
         LIMIT $1",
    )
    .bind(limit_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(UserProgress::try_from).collect()
}

/// 1-based leaderboard position of a user, or `None` if they have no record.
pub async fn get_rank(db: &Database, user_id: u64) -> anyhow::Result<Option<u64>> {
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let rank: Option<i64> = sqlx::query_scalar(
        "SELECT (
            SELECT COUNT(*) FROM user_progress other
            WHERE (other.level, other.xp) > (me.level, me.xp)
         ) + 1
         FROM user_progress me
         WHERE me.user_id = $1",
    )
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    rank.map(u64::try_from)
        .transpose()
        .context("rank out of u64 range")
}
