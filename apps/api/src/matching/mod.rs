//! The match engine: finds counter-parties sharing a posting's tag and
//! creates symmetric, de-duplicated match state for each new pair.
//!
//! De-duplication rides the UNIQUE (user_id, counterpart_id, keyword) index
//! on `match_results`: the first projection row is inserted with
//! `ON CONFLICT DO NOTHING`, so the existence check and the reservation are
//! one atomic statement and concurrent submissions for the same pair cannot
//! both win.

pub mod connect;
pub mod handlers;
pub mod results;

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::matching::MatchRecordRow;
use crate::models::posting::{PostingRow, PostingStatus};
use crate::models::Pagination;

/// Counters from one full-sweep run.
#[derive(Debug, Default)]
pub struct SweepStats {
    pub postings_scanned: usize,
    pub pairs_created: u32,
    pub invalidated: u64,
}

/// Finds every live posting sharing `posting.tag` with a different owner and
/// creates match state for each pair not seen before. Returns the number of
/// newly created pairs.
///
/// A failure on one pair rolls back that pair only; the remaining candidates
/// are still attempted.
pub async fn match_for_posting(
    pool: &PgPool,
    connect_window_hours: i64,
    posting: &PostingRow,
) -> Result<u32, AppError> {
    // The tag-equality filter is pushed down to the store. Scope filters on
    // the posting (geo/gender/age) are stored but not consulted here.
    let candidates: Vec<PostingRow> = sqlx::query_as(
        "SELECT * FROM postings
         WHERE tag = $1 AND user_id != $2 AND status != 'invalid' AND deleted_at IS NULL",
    )
    .bind(&posting.tag)
    .bind(posting.user_id)
    .fetch_all(pool)
    .await?;

    let mut created = 0u32;
    for candidate in &candidates {
        match create_pair_if_absent(pool, connect_window_hours, posting, candidate).await {
            Ok(true) => created += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(
                    posting_id = posting.id,
                    candidate_id = candidate.id,
                    error = %e,
                    "pair creation failed, continuing with next candidate"
                );
            }
        }
    }

    if created > 0 {
        info!(
            posting_id = posting.id,
            tag = %posting.tag,
            created,
            "matches created"
        );
    }
    Ok(created)
}

/// Creates the full symmetric match state for one pair inside a single
/// transaction, or does nothing if the pair already exists in either
/// direction. Returns whether a new pair was created.
async fn create_pair_if_absent(
    pool: &PgPool,
    connect_window_hours: i64,
    posting: &PostingRow,
    candidate: &PostingRow,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    // An existing friend edge between the owners suppresses re-matching.
    let already_friends: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM friend_edges
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        )",
    )
    .bind(posting.user_id)
    .bind(candidate.user_id)
    .fetch_one(&mut *tx)
    .await?;

    if already_friends {
        return Ok(false);
    }

    let now = Utc::now();
    let deadline = connect_deadline(now, connect_window_hours);

    // Contact snapshots are taken at match time; they do not track later
    // profile edits.
    let posting_owner_email = visible_email(&mut *tx, posting.user_id).await?;
    let candidate_owner_email = visible_email(&mut *tx, candidate.user_id).await?;

    // The reservation: zero rows affected means some direction of this pair
    // already exists, committed or in flight.
    let reserved = sqlx::query(
        "INSERT INTO match_results (user_id, counterpart_id, keyword, counterpart_email, matched_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, counterpart_id, keyword) DO NOTHING",
    )
    .bind(posting.user_id)
    .bind(candidate.user_id)
    .bind(&posting.tag)
    .bind(&candidate_owner_email)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if reserved == 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO match_results (user_id, counterpart_id, keyword, counterpart_email, matched_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, counterpart_id, keyword) DO NOTHING",
    )
    .bind(candidate.user_id)
    .bind(posting.user_id)
    .bind(&posting.tag)
    .bind(&posting_owner_email)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // One record per direction, each with its own deadline bookkeeping.
    for (subject, counterpart) in [
        (posting.user_id, candidate.user_id),
        (candidate.user_id, posting.user_id),
    ] {
        sqlx::query(
            "INSERT INTO match_records
                 (user_id, counterpart_id, tag, match_basis,
                  match_country, match_province, match_city, match_district,
                  status, connect_deadline)
             VALUES ($1, $2, $3, 'keyword', $4, $5, $6, $7, 'matched', $8)",
        )
        .bind(subject)
        .bind(counterpart)
        .bind(&posting.tag)
        .bind(&posting.country)
        .bind(&posting.province)
        .bind(&posting.city)
        .bind(&posting.district)
        .bind(deadline)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE postings
         SET match_count = match_count + 1, is_matched = TRUE, updated_at = NOW()
         WHERE id = $1 OR id = $2",
    )
    .bind(posting.id)
    .bind(candidate.id)
    .execute(&mut *tx)
    .await?;

    // Standing subscriptions owned by either party accumulate the hit too.
    sqlx::query(
        "UPDATE match_lists
         SET match_count = match_count + 1, updated_at = NOW()
         WHERE (user_id = $1 OR user_id = $2) AND keyword = $3 AND status = 'active'",
    )
    .bind(posting.user_id)
    .bind(candidate.user_id)
    .bind(&posting.tag)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// The window within which an ordinary (unpaid) connect is allowed, fixed
/// at match creation.
fn connect_deadline(created_at: DateTime<Utc>, window_hours: i64) -> DateTime<Utc> {
    created_at + Duration::hours(window_hours)
}

/// The counterpart email snapshot, empty when the user has no contact on
/// file or keeps it hidden from match results.
async fn visible_email(conn: &mut PgConnection, user_id: i64) -> Result<String, AppError> {
    let email: Option<String> = sqlx::query_scalar(
        "SELECT email FROM user_contacts WHERE user_id = $1 AND email_visible",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(email.unwrap_or_default())
}

/// Periodic backstop behind the synchronous per-posting path.
///
/// First invalidates postings whose owner no longer exists (account deletion
/// upstream does not cascade here), then re-runs the per-posting matching
/// over every live posting. Per-unit failures are logged and skipped; the
/// sweep itself never aborts.
pub async fn run_full_sweep(
    pool: &PgPool,
    connect_window_hours: i64,
) -> Result<SweepStats, AppError> {
    let mut stats = SweepStats::default();

    stats.invalidated = sqlx::query(
        "UPDATE postings
         SET status = $1, is_matched = TRUE, updated_at = NOW()
         WHERE status = $2 AND is_matched = FALSE
           AND NOT EXISTS (SELECT 1 FROM users WHERE users.id = postings.user_id)",
    )
    .bind(PostingStatus::Invalid.as_str())
    .bind(PostingStatus::Active.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if stats.invalidated > 0 {
        info!(
            invalidated = stats.invalidated,
            "postings invalidated (owner gone)"
        );
    }

    let live: Vec<PostingRow> = sqlx::query_as(
        "SELECT * FROM postings WHERE status != 'invalid' AND deleted_at IS NULL",
    )
    .fetch_all(pool)
    .await?;
    stats.postings_scanned = live.len();

    for posting in &live {
        match match_for_posting(pool, connect_window_hours, posting).await {
            Ok(created) => stats.pairs_created += created,
            Err(e) => {
                warn!(posting_id = posting.id, error = %e, "sweep unit failed, skipping");
            }
        }
    }

    info!(
        scanned = stats.postings_scanned,
        created = stats.pairs_created,
        "full match sweep finished"
    );
    Ok(stats)
}

/// A user's directional match records, newest first.
pub async fn records_for_user(
    pool: &PgPool,
    user_id: i64,
    page: &Pagination,
) -> Result<Vec<MatchRecordRow>, AppError> {
    Ok(sqlx::query_as::<_, MatchRecordRow>(
        "SELECT * FROM match_records
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

/// One match record, restricted to its parties.
pub async fn record_for_party(
    pool: &PgPool,
    user_id: i64,
    match_id: i64,
) -> Result<MatchRecordRow, AppError> {
    let record: Option<MatchRecordRow> =
        sqlx::query_as("SELECT * FROM match_records WHERE id = $1")
            .bind(match_id)
            .fetch_optional(pool)
            .await?;

    let record =
        record.ok_or_else(|| AppError::NotFound(format!("Match {match_id} not found")))?;

    if record.user_id != user_id && record.counterpart_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_is_creation_plus_window() {
        let created = Utc::now();
        let deadline = connect_deadline(created, 24);
        assert_eq!(deadline - created, Duration::hours(24));
    }

    #[test]
    fn test_deadline_respects_configured_window() {
        let created = Utc::now();
        assert_eq!(connect_deadline(created, 1) - created, Duration::hours(1));
        assert_eq!(connect_deadline(created, 72) - created, Duration::hours(72));
    }
}
