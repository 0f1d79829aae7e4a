use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only record of a balance change. Always written in the same
/// transaction as the `users.coins` mutation it documents; the sum of a
/// user's deltas reconciles with their current balance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntryRow {
    pub id: i64,
    pub user_id: i64,
    /// Signed coin delta: negative for spends, positive for credits.
    pub delta: i64,
    pub entry_type: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
