//! Friend-connection actions on a match record.
//!
//! Ordinary connect is free inside the deadline; after the deadline the only
//! path is the paid force-add, and only when the target allows being added
//! passively. Both flip every `matched` record between the two users for the
//! tag, so the mirror record cannot later resolve differently.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::ledger;
use crate::matching::record_for_party;
use crate::models::matching::MatchStatus;
use crate::models::user::UserRow;

/// Ordinary friend connection, allowed while the record is `matched` and the
/// deadline has not passed. Creates the edge pair idempotently.
pub async fn add_friend(pool: &PgPool, user_id: i64, match_id: i64) -> Result<(), AppError> {
    let record = record_for_party(pool, user_id, match_id).await?;

    let connectable = MatchStatus::parse(&record.status)
        .is_some_and(|s| s.can_transition_to(MatchStatus::FriendAdded));
    if !connectable {
        return Err(AppError::Validation(format!(
            "Match is already '{}'",
            record.status
        )));
    }
    if Utc::now() > record.connect_deadline {
        return Err(AppError::Validation(
            "Connection deadline has passed, use force add".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    create_edge_pair(&mut *tx, record.user_id, record.counterpart_id).await?;
    mark_pair_friend_added(&mut *tx, record.user_id, record.counterpart_id, &record.tag).await?;
    tx.commit().await?;

    info!(match_id, user_id, "friends connected");
    Ok(())
}

/// Paid connection after the deadline. The target must allow passive
/// addition; the debit, the edge pair and the status flip commit together.
/// If the two users are already friends the record is closed out without
/// charging.
pub async fn force_add_friend(
    pool: &PgPool,
    cost_coins: i64,
    user_id: i64,
    match_id: i64,
) -> Result<(), AppError> {
    let record = record_for_party(pool, user_id, match_id).await?;

    let connectable = MatchStatus::parse(&record.status)
        .is_some_and(|s| s.can_transition_to(MatchStatus::FriendAdded));
    if !connectable {
        return Err(AppError::Validation(format!(
            "Match is already '{}'",
            record.status
        )));
    }
    if Utc::now() <= record.connect_deadline {
        return Err(AppError::Validation(
            "Still within the connection deadline, use the ordinary add".to_string(),
        ));
    }

    let target_id = if record.user_id == user_id {
        record.counterpart_id
    } else {
        record.user_id
    };

    let target: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(pool)
        .await?;
    let target =
        target.ok_or_else(|| AppError::NotFound(format!("User {target_id} not found")))?;

    if !target.allow_passive_add {
        return Err(AppError::Validation(
            "Counterpart does not allow passive friend addition".to_string(),
        ));
    }

    let already_friends: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM friend_edges
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        )",
    )
    .bind(user_id)
    .bind(target_id)
    .fetch_one(pool)
    .await?;

    let mut tx = pool.begin().await?;

    if !already_friends {
        ledger::debit(
            &mut *tx,
            user_id,
            cost_coins,
            "force_add",
            &format!("Forced friend connection with {}", target.nickname),
        )
        .await?;
        create_edge_pair(&mut *tx, user_id, target_id).await?;
    }

    mark_pair_friend_added(&mut *tx, record.user_id, record.counterpart_id, &record.tag).await?;
    tx.commit().await?;

    info!(
        match_id,
        user_id,
        target_id,
        charged = !already_friends,
        "forced friend connection"
    );
    Ok(())
}

/// Inserts both directed edges. `ON CONFLICT DO NOTHING` keeps repeated
/// creation (connect racing the resolver, or a re-run tick) idempotent.
pub async fn create_edge_pair(
    conn: &mut PgConnection,
    user_a: i64,
    user_b: i64,
) -> Result<(), AppError> {
    for (from, to) in [(user_a, user_b), (user_b, user_a)] {
        sqlx::query(
            "INSERT INTO friend_edges (user_id, friend_id, status)
             VALUES ($1, $2, 'accepted')
             ON CONFLICT (user_id, friend_id) DO NOTHING",
        )
        .bind(from)
        .bind(to)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Closes out both directional records for the pair and tag. The status
/// guard keeps terminal records terminal.
async fn mark_pair_friend_added(
    conn: &mut PgConnection,
    user_a: i64,
    user_b: i64,
    tag: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE match_records
         SET status = 'friend_added', updated_at = NOW()
         WHERE status = 'matched' AND tag = $1
           AND ((user_id = $2 AND counterpart_id = $3) OR (user_id = $3 AND counterpart_id = $2))",
    )
    .bind(tag)
    .bind(user_a)
    .bind(user_b)
    .execute(conn)
    .await?;
    Ok(())
}
