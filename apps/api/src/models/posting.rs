use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user's tag submission eligible for matching.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostingRow {
    pub id: i64,
    pub user_id: i64,
    /// Exact-match interest keyword driving matching.
    pub tag: String,

    // Scope filters. Stored and surfaced, but not consulted by the matcher.
    pub country: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub gender: i32,
    pub age_min: i32,
    pub age_max: i32,

    pub status: String,
    pub audit_status: String,
    pub audit_by: Option<i64>,
    pub audit_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,

    pub expires_at: DateTime<Utc>,
    pub cost_coins: i64,
    pub match_count: i32,
    pub is_matched: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingStatus {
    Active,
    Expired,
    Invalid,
}

impl PostingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostingStatus::Active => "active",
            PostingStatus::Expired => "expired",
            PostingStatus::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Pending,
    Approved,
    Rejected,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Approved => "approved",
            AuditStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AuditStatus::Pending),
            "approved" => Some(AuditStatus::Approved),
            "rejected" => Some(AuditStatus::Rejected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_status_round_trip() {
        for status in [
            AuditStatus::Pending,
            AuditStatus::Approved,
            AuditStatus::Rejected,
        ] {
            assert_eq!(AuditStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AuditStatus::parse("bogus"), None);
    }
}
