//! Posting lifecycle owned by the submitting user: submit, renew, resubmit,
//! edit, soft delete. Every paid action debits inside the same transaction
//! that mutates the posting; matching and hot-tag bookkeeping run after
//! commit as best-effort follow-ups.

pub mod handlers;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::hot_tags;
use crate::ledger;
use crate::matching;
use crate::models::posting::PostingRow;
use crate::models::Pagination;
use crate::state::AppState;

const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub tag: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub gender: i32,
    #[serde(default = "default_age_min")]
    pub age_min: i32,
    #[serde(default = "default_age_max")]
    pub age_max: i32,
}

fn default_age_min() -> i32 {
    20
}

fn default_age_max() -> i32 {
    30
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub posting: PostingRow,
    /// Pairs created by the synchronous match pass that follows submission.
    pub match_count: u32,
}

fn validate_tag(tag: &str) -> Result<&str, AppError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(AppError::Validation("Tag must not be empty".to_string()));
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(AppError::Validation(format!(
            "Tag is limited to {MAX_TAG_LEN} characters"
        )));
    }
    Ok(tag)
}

/// Charges the posting cost and creates the posting in one transaction,
/// then feeds the hot-tag counters and runs the matcher for immediate
/// feedback.
pub async fn submit(
    state: &AppState,
    user_id: i64,
    req: &SubmitRequest,
) -> Result<SubmitResponse, AppError> {
    let tag = validate_tag(&req.tag)?;
    let cost = state.config.posting_cost;
    let expires_at = Utc::now() + Duration::hours(state.config.posting_ttl_hours);

    let mut tx = state.db.begin().await?;
    ledger::debit(
        &mut *tx,
        user_id,
        cost,
        "posting",
        &format!("Posting submission: {tag}"),
    )
    .await?;

    let posting: PostingRow = sqlx::query_as(
        "INSERT INTO postings
             (user_id, tag, country, province, city, district, gender, age_min, age_max,
              status, audit_status, expires_at, cost_coins)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active', $10, $11, $12)
         RETURNING *",
    )
    .bind(user_id)
    .bind(tag)
    .bind(&req.country)
    .bind(&req.province)
    .bind(&req.city)
    .bind(&req.district)
    .bind(req.gender)
    .bind(req.age_min)
    .bind(req.age_max)
    .bind(state.audit.default_status().as_str())
    .bind(expires_at)
    .bind(cost)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let match_count = post_commit_followups(state, &posting).await;
    Ok(SubmitResponse {
        posting,
        match_count,
    })
}

/// Hot-tag touch plus the synchronous match pass. Both are best-effort once
/// the posting is committed; the full sweep backstops anything missed here.
async fn post_commit_followups(state: &AppState, posting: &PostingRow) -> u32 {
    if let Err(e) = hot_tags::touch(&state.db, &posting.tag).await {
        warn!(posting_id = posting.id, error = %e, "hot tag touch failed");
    }

    match matching::match_for_posting(&state.db, state.config.connect_window_hours, posting).await
    {
        Ok(created) => created,
        Err(e) => {
            warn!(posting_id = posting.id, error = %e, "synchronous match pass failed");
            0
        }
    }
}

/// Paid extension: the TTL grows by one window from whichever is later,
/// now or the current expiry. An expired posting comes back active.
pub async fn renew(state: &AppState, user_id: i64, posting_id: i64) -> Result<PostingRow, AppError> {
    let current = owned(&state.db, user_id, posting_id).await?;
    let ttl = Duration::hours(state.config.posting_ttl_hours);
    let expires_at = current.expires_at.max(Utc::now()) + ttl;

    let mut tx = state.db.begin().await?;
    ledger::debit(
        &mut *tx,
        user_id,
        state.config.posting_cost,
        "renew",
        &format!("Posting renewal #{posting_id}"),
    )
    .await?;

    let posting: PostingRow = sqlx::query_as(
        "UPDATE postings
         SET expires_at = $1, status = 'active', updated_at = NOW()
         WHERE id = $2
         RETURNING *",
    )
    .bind(expires_at)
    .bind(posting_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(posting)
}

/// Paid fresh start: active again with a full TTL, audit state reset to the
/// gate default, and a new synchronous match pass.
pub async fn resubmit(
    state: &AppState,
    user_id: i64,
    posting_id: i64,
) -> Result<SubmitResponse, AppError> {
    owned(&state.db, user_id, posting_id).await?;
    let cost = state.config.posting_cost;
    let expires_at = Utc::now() + Duration::hours(state.config.posting_ttl_hours);

    let mut tx = state.db.begin().await?;
    ledger::debit(
        &mut *tx,
        user_id,
        cost,
        "resubmit",
        &format!("Posting resubmission #{posting_id}"),
    )
    .await?;

    let posting: PostingRow = sqlx::query_as(
        "UPDATE postings
         SET status = 'active', audit_status = $1, audit_by = NULL, audit_at = NULL,
             reject_reason = NULL, expires_at = $2, cost_coins = $3,
             updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(state.audit.default_status().as_str())
    .bind(expires_at)
    .bind(cost)
    .bind(posting_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let match_count = post_commit_followups(state, &posting).await;
    Ok(SubmitResponse {
        posting,
        match_count,
    })
}

/// Owner edit of the tag and scope filters. Any edit resets the audit state
/// to the gate default, and the matcher runs again for the possibly new tag.
pub async fn update(
    state: &AppState,
    user_id: i64,
    posting_id: i64,
    req: &SubmitRequest,
) -> Result<SubmitResponse, AppError> {
    let tag = validate_tag(&req.tag)?;
    owned(&state.db, user_id, posting_id).await?;

    let posting: PostingRow = sqlx::query_as(
        "UPDATE postings
         SET tag = $1, country = $2, province = $3, city = $4, district = $5,
             gender = $6, age_min = $7, age_max = $8,
             audit_status = $9, audit_by = NULL, audit_at = NULL, reject_reason = NULL,
             updated_at = NOW()
         WHERE id = $10
         RETURNING *",
    )
    .bind(tag)
    .bind(&req.country)
    .bind(&req.province)
    .bind(&req.city)
    .bind(&req.district)
    .bind(req.gender)
    .bind(req.age_min)
    .bind(req.age_max)
    .bind(state.audit.default_status().as_str())
    .bind(posting_id)
    .fetch_one(&state.db)
    .await?;

    let match_count = post_commit_followups(state, &posting).await;
    Ok(SubmitResponse {
        posting,
        match_count,
    })
}

/// Owner soft delete. The row stays for the audit trail but leaves every
/// query surface.
pub async fn delete(pool: &PgPool, user_id: i64, posting_id: i64) -> Result<(), AppError> {
    let deleted = sqlx::query(
        "UPDATE postings SET deleted_at = NOW(), updated_at = NOW()
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(posting_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Posting {posting_id} not found"
        )));
    }
    Ok(())
}

/// The caller's own postings, newest first, soft-deleted rows excluded.
pub async fn mine(
    pool: &PgPool,
    user_id: i64,
    page: &Pagination,
) -> Result<Vec<PostingRow>, AppError> {
    Ok(sqlx::query_as::<_, PostingRow>(
        "SELECT * FROM postings
         WHERE user_id = $1 AND deleted_at IS NULL
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?)
}

/// One posting, restricted to its owner.
pub async fn owned(pool: &PgPool, user_id: i64, posting_id: i64) -> Result<PostingRow, AppError> {
    let posting: Option<PostingRow> =
        sqlx::query_as("SELECT * FROM postings WHERE id = $1 AND deleted_at IS NULL")
            .bind(posting_id)
            .fetch_optional(pool)
            .await?;

    let posting =
        posting.ok_or_else(|| AppError::NotFound(format!("Posting {posting_id} not found")))?;

    if posting.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(posting)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_trimmed_and_required() {
        assert_eq!(validate_tag("  coffee ").unwrap(), "coffee");
        assert!(validate_tag("   ").is_err());
        assert!(validate_tag("").is_err());
    }

    #[test]
    fn test_tag_length_bounded() {
        let long = "x".repeat(MAX_TAG_LEN + 1);
        assert!(validate_tag(&long).is_err());
        let ok = "x".repeat(MAX_TAG_LEN);
        assert!(validate_tag(&ok).is_ok());
    }
}
