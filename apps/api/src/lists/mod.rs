//! Standing match lists: long-lived keyword subscriptions that cost one coin
//! per day up front and collect match counts while active. The scheduler
//! expires them alongside postings.

pub mod handlers;

use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::hot_tags;
use crate::ledger;
use crate::models::matching::MatchListRow;
use crate::models::Pagination;
use crate::state::AppState;

const MAX_DURATION_DAYS: i32 = 365;

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub keyword: String,
    pub duration_days: i32,
}

/// Charges `duration_days` coins and opens the subscription in one
/// transaction. A user may not hold two active lists for the same keyword.
pub async fn create(
    state: &AppState,
    user_id: i64,
    req: &CreateListRequest,
) -> Result<MatchListRow, AppError> {
    let keyword = req.keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("Keyword must not be empty".to_string()));
    }
    if req.duration_days < 1 || req.duration_days > MAX_DURATION_DAYS {
        return Err(AppError::Validation(format!(
            "Duration must be between 1 and {MAX_DURATION_DAYS} days"
        )));
    }

    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM match_lists
            WHERE user_id = $1 AND keyword = $2 AND status = 'active'
        )",
    )
    .bind(user_id)
    .bind(keyword)
    .fetch_one(&state.db)
    .await?;

    if duplicate {
        return Err(AppError::Validation(format!(
            "An active list for '{keyword}' already exists"
        )));
    }

    let cost = i64::from(req.duration_days);
    let expire_at = Utc::now() + Duration::days(i64::from(req.duration_days));

    let mut tx = state.db.begin().await?;
    ledger::debit(
        &mut *tx,
        user_id,
        cost,
        "list",
        &format!("Match list for '{keyword}', {} days", req.duration_days),
    )
    .await?;

    let list: MatchListRow = sqlx::query_as(
        "INSERT INTO match_lists (user_id, keyword, duration_days, cost_coins, status, expire_at)
         VALUES ($1, $2, $3, $4, 'active', $5)
         RETURNING *",
    )
    .bind(user_id)
    .bind(keyword)
    .bind(req.duration_days)
    .bind(cost)
    .bind(expire_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Err(e) = hot_tags::touch(&state.db, keyword).await {
        warn!(list_id = list.id, error = %e, "hot tag touch failed");
    }
    Ok(list)
}

/// The caller's lists, newest first.
pub async fn list(
    pool: &PgPool,
    user_id: i64,
    page: &Pagination,
) -> Result<Vec<MatchListRow>, AppError> {
    Ok(sqlx::query_as::<_, MatchListRow>(
        "SELECT * FROM match_lists
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?)
}

/// Owner deactivation. The row stays for bookkeeping; no refund for the
/// remaining days.
pub async fn deactivate(pool: &PgPool, user_id: i64, list_id: i64) -> Result<(), AppError> {
    let updated = sqlx::query(
        "UPDATE match_lists SET status = 'inactive', updated_at = NOW()
         WHERE id = $1 AND user_id = $2 AND status = 'active'",
    )
    .bind(list_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Active match list {list_id} not found"
        )));
    }
    Ok(())
}
