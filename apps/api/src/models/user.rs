use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub nickname: String,
    pub coins: i64,
    /// Whether other users searching this user's region may match them.
    pub location_visible: bool,
    /// Opt-in to being auto-connected when a match deadline lapses.
    pub allow_passive_add: bool,
    /// Opt-in to being the target of a paid forced connection.
    pub allow_force_add: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserContactRow {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub email_verified: bool,
    /// Whether the email may be shown in counterpart match results.
    pub email_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
