//! Audit gate: postings start `pending` and become visible/matchable only
//! once approved. Rejection refunds the recorded cost in the same
//! transaction as the state flip.

pub mod handlers;

use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::ledger;
use crate::models::posting::{AuditStatus, PostingRow};
use crate::models::Pagination;

/// Holds the audit default for new submissions. The default comes from
/// configuration at startup; flipping it at runtime only affects postings
/// submitted afterwards. Draining the pending queue is a separate explicit
/// admin command (`approve_all_pending`), never a side effect of the flip.
pub struct AuditGate {
    enabled: AtomicBool,
}

impl AuditGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Audit status assigned to a fresh or resubmitted posting.
    pub fn default_status(&self) -> AuditStatus {
        if self.is_enabled() {
            AuditStatus::Pending
        } else {
            AuditStatus::Approved
        }
    }
}

/// Postings awaiting review, oldest first so the queue drains in order.
pub async fn pending(pool: &PgPool, page: &Pagination) -> Result<Vec<PostingRow>, AppError> {
    Ok(sqlx::query_as::<_, PostingRow>(
        "SELECT * FROM postings
         WHERE audit_status = 'pending' AND deleted_at IS NULL
         ORDER BY created_at ASC
         LIMIT $1 OFFSET $2",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?)
}

/// Marks a posting approved, recording the acting admin and the decision
/// time. Clears any reason left over from an earlier rejection.
pub async fn approve(pool: &PgPool, posting_id: i64, actor: i64) -> Result<(), AppError> {
    let updated = sqlx::query(
        "UPDATE postings
         SET audit_status = 'approved', audit_by = $1, audit_at = NOW(),
             reject_reason = NULL, updated_at = NOW()
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(actor)
    .bind(posting_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Posting {posting_id} not found"
        )));
    }

    info!(posting_id, actor, "posting approved");
    Ok(())
}

/// Rejects a posting. The reason is mandatory, and when the posting carried
/// a cost the same transaction credits it back with a `refund` entry; the
/// state flip and the refund are never observable separately.
pub async fn reject(
    pool: &PgPool,
    posting_id: i64,
    actor: i64,
    reason: &str,
) -> Result<(), AppError> {
    let reason = validate_reason(reason)?;

    let mut tx = pool.begin().await?;

    let posting: Option<PostingRow> = sqlx::query_as(
        "SELECT * FROM postings WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(posting_id)
    .fetch_optional(&mut *tx)
    .await?;

    let posting = posting
        .ok_or_else(|| AppError::NotFound(format!("Posting {posting_id} not found")))?;

    // A repeated reject must not refund twice.
    if AuditStatus::parse(&posting.audit_status) == Some(AuditStatus::Rejected) {
        return Err(AppError::Validation(format!(
            "Posting {posting_id} is already rejected"
        )));
    }

    sqlx::query(
        "UPDATE postings
         SET audit_status = 'rejected', audit_by = $1, audit_at = NOW(),
             reject_reason = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(actor)
    .bind(reason)
    .bind(posting_id)
    .execute(&mut *tx)
    .await?;

    if posting.cost_coins > 0 {
        ledger::credit(
            &mut *tx,
            posting.user_id,
            posting.cost_coins,
            "refund",
            &format!("Refund for rejected posting #{posting_id}: {reason}"),
        )
        .await?;
    }

    tx.commit().await?;

    info!(
        posting_id,
        actor,
        refunded = posting.cost_coins,
        "posting rejected"
    );
    Ok(())
}

fn validate_reason(reason: &str) -> Result<&str, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    Ok(reason)
}

/// Bulk-approves every pending posting. This is the explicit queue-drain
/// command an admin issues after disabling auditing; it is not triggered by
/// the toggle itself.
pub async fn approve_all_pending(pool: &PgPool, actor: i64) -> Result<u64, AppError> {
    let drained = sqlx::query(
        "UPDATE postings
         SET audit_status = 'approved', audit_by = $1, audit_at = NOW(),
             reject_reason = NULL, updated_at = NOW()
         WHERE audit_status = 'pending' AND deleted_at IS NULL",
    )
    .bind(actor)
    .execute(pool)
    .await?
    .rows_affected();

    info!(actor, drained, "pending audit queue drained");
    Ok(drained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_follows_switch() {
        let gate = AuditGate::new(true);
        assert_eq!(gate.default_status(), AuditStatus::Pending);

        gate.set_enabled(false);
        assert_eq!(gate.default_status(), AuditStatus::Approved);

        gate.set_enabled(true);
        assert_eq!(gate.default_status(), AuditStatus::Pending);
    }

    #[test]
    fn test_reject_reason_required() {
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert_eq!(validate_reason(" policy ").unwrap(), "policy");
    }
}
