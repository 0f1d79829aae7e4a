//! Rolling popularity counters per keyword.
//!
//! Keywords are created lazily in `hide` on first touch and accrue nothing
//! until an operator promotes them to `show`. The count-only-if-shown rule
//! applies uniformly to submission and click traffic.

pub mod handlers;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::hot_tag::{HotTagRow, TagVisibility};

/// Counter a top-N query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagWindow {
    Day,
    Total,
}

impl TagWindow {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "24h" => Some(TagWindow::Day),
            "total" => Some(TagWindow::Total),
            _ => None,
        }
    }
}

/// Whether a touch at `now` falls inside the rolling 24h window that began
/// at the previous touch. A keyword never touched before starts a new window.
fn within_rolling_window(last_search_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_search_at {
        Some(last) => now - last <= Duration::hours(24),
        None => false,
    }
}

/// Records one submission (or click) of `keyword`.
///
/// Unseen keywords are inserted hidden with zeroed counters; the insert is
/// `ON CONFLICT DO NOTHING` so concurrent first touches stay idempotent.
/// Hidden and blackholed keywords do not accumulate counts.
pub async fn touch(pool: &PgPool, keyword: &str) -> Result<(), AppError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("Keyword must not be empty".to_string()));
    }

    let created = sqlx::query(
        "INSERT INTO hot_tags (keyword, count_24h, count_total, submit_count, status, last_search_at)
         VALUES ($1, 0, 0, 0, 'hide', NOW())
         ON CONFLICT (keyword) DO NOTHING",
    )
    .bind(keyword)
    .execute(pool)
    .await?
    .rows_affected();

    if created > 0 {
        info!(keyword, "new keyword registered (hidden)");
        return Ok(());
    }

    let tag: Option<HotTagRow> = sqlx::query_as("SELECT * FROM hot_tags WHERE keyword = $1")
        .bind(keyword)
        .fetch_optional(pool)
        .await?;

    let Some(tag) = tag else {
        return Ok(());
    };

    if TagVisibility::parse(&tag.status) != Some(TagVisibility::Show) {
        return Ok(());
    }

    let now = Utc::now();
    let count_24h = if within_rolling_window(tag.last_search_at, now) {
        tag.count_24h + 1
    } else {
        1
    };

    sqlx::query(
        "UPDATE hot_tags
         SET count_24h = $1, count_total = count_total + 1,
             submit_count = submit_count + 1, last_search_at = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(count_24h)
    .bind(now)
    .bind(tag.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Tag-click traffic counts the same way submissions do.
pub async fn click(pool: &PgPool, keyword: &str) -> Result<(), AppError> {
    touch(pool, keyword).await
}

/// The `n` most popular promoted keywords for the requested window,
/// ties broken by most recent activity.
pub async fn top(pool: &PgPool, n: i64, window: TagWindow) -> Result<Vec<HotTagRow>, AppError> {
    let sql = match window {
        TagWindow::Day => {
            "SELECT * FROM hot_tags WHERE status = 'show'
             ORDER BY count_24h DESC, last_search_at DESC NULLS LAST
             LIMIT $1"
        }
        TagWindow::Total => {
            "SELECT * FROM hot_tags WHERE status = 'show'
             ORDER BY count_total DESC, last_search_at DESC NULLS LAST
             LIMIT $1"
        }
    };

    Ok(sqlx::query_as::<_, HotTagRow>(sql)
        .bind(n.clamp(1, 100))
        .fetch_all(pool)
        .await?)
}

/// Zeroes every 24h counter. Run by the scheduler at local midnight.
pub async fn reset_24h(pool: &PgPool) -> Result<u64, AppError> {
    let reset = sqlx::query("UPDATE hot_tags SET count_24h = 0, updated_at = NOW()")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(reset)
}

/// Operator promotion/demotion of a keyword's visibility.
pub async fn set_status(pool: &PgPool, id: i64, status: TagVisibility) -> Result<(), AppError> {
    let updated = sqlx::query("UPDATE hot_tags SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!("Hot tag {id} not found")));
    }

    info!(id, status = status.as_str(), "hot tag visibility changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_touched_starts_new_window() {
        assert!(!within_rolling_window(None, Utc::now()));
    }

    #[test]
    fn test_touch_inside_24h_stays_in_window() {
        let now = Utc::now();
        assert!(within_rolling_window(Some(now - Duration::hours(23)), now));
        assert!(within_rolling_window(Some(now - Duration::hours(24)), now));
        assert!(within_rolling_window(Some(now), now));
    }

    #[test]
    fn test_touch_past_24h_resets_window() {
        let now = Utc::now();
        assert!(!within_rolling_window(
            Some(now - Duration::hours(24) - Duration::seconds(1)),
            now
        ));
        assert!(!within_rolling_window(Some(now - Duration::days(3)), now));
    }

    #[test]
    fn test_window_parse() {
        assert_eq!(TagWindow::parse("24h"), Some(TagWindow::Day));
        assert_eq!(TagWindow::parse("total"), Some(TagWindow::Total));
        assert_eq!(TagWindow::parse("weekly"), None);
    }
}
