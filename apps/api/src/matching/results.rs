//! Per-user match result projections: the rows a user actually reads, each
//! carrying the counterpart contact snapshot taken at match time plus the
//! user's own annotations.

use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::ledger;
use crate::models::matching::MatchResultRow;
use crate::models::Pagination;
use crate::notify::Notifier;
use crate::state::AppState;

const MAX_REMARK_LEN: usize = 500;

/// A user's results, newest match first.
pub async fn list(
    pool: &PgPool,
    user_id: i64,
    page: &Pagination,
) -> Result<Vec<MatchResultRow>, AppError> {
    Ok(sqlx::query_as::<_, MatchResultRow>(
        "SELECT * FROM match_results
         WHERE user_id = $1
         ORDER BY matched_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?)
}

async fn owned(pool: &PgPool, user_id: i64, result_id: i64) -> Result<MatchResultRow, AppError> {
    let result: Option<MatchResultRow> =
        sqlx::query_as("SELECT * FROM match_results WHERE id = $1 AND user_id = $2")
            .bind(result_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    result.ok_or_else(|| AppError::NotFound(format!("Match result {result_id} not found")))
}

/// Marks a result as seen by its owner.
pub async fn mark_known(pool: &PgPool, user_id: i64, result_id: i64) -> Result<(), AppError> {
    let updated = sqlx::query(
        "UPDATE match_results SET is_known = TRUE, updated_at = NOW()
         WHERE id = $1 AND user_id = $2",
    )
    .bind(result_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Match result {result_id} not found"
        )));
    }
    Ok(())
}

/// Replaces the owner's free-text note on a result.
pub async fn update_remark(
    pool: &PgPool,
    user_id: i64,
    result_id: i64,
    remark: &str,
) -> Result<(), AppError> {
    if remark.chars().count() > MAX_REMARK_LEN {
        return Err(AppError::Validation(format!(
            "Remark is limited to {MAX_REMARK_LEN} characters"
        )));
    }

    let updated = sqlx::query(
        "UPDATE match_results SET remark = $1, updated_at = NOW()
         WHERE id = $2 AND user_id = $3",
    )
    .bind(remark)
    .bind(result_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Match result {result_id} not found"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct NotifyOutcome {
    pub sent: bool,
}

/// Explicit user action that pushes the match to the counterpart contact.
///
/// The notify cost is debited first, in its own transaction with its ledger
/// entry. Delivery then happens out-of-band through the `Notifier`
/// collaborator: a failure is logged and reported as unsent, it never
/// unwinds the charge or any match state. Already-notified results are a
/// no-op and are not re-charged.
pub async fn notify(
    state: &AppState,
    user_id: i64,
    result_id: i64,
) -> Result<NotifyOutcome, AppError> {
    let result = owned(&state.db, user_id, result_id).await?;

    if result.notified {
        return Ok(NotifyOutcome { sent: true });
    }
    if result.counterpart_email.is_empty() {
        return Err(AppError::Validation(
            "Counterpart has no visible contact to notify".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;
    ledger::debit(
        &mut *tx,
        user_id,
        state.config.notify_cost,
        "notify",
        &format!("Match notification for keyword '{}'", result.keyword),
    )
    .await?;
    tx.commit().await?;

    match state
        .notifier
        .send_match_notification(result.counterpart_id, &result.counterpart_email, &result.keyword)
        .await
    {
        Ok(()) => {
            sqlx::query(
                "UPDATE match_results SET notified = TRUE, notified_at = NOW(), updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(result_id)
            .execute(&state.db)
            .await?;
            Ok(NotifyOutcome { sent: true })
        }
        Err(e) => {
            warn!(result_id, error = %e, "match notification delivery failed");
            Ok(NotifyOutcome { sent: false })
        }
    }
}
