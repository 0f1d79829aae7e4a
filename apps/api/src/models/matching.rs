use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One directional record of a successful pairing. Every match produces two,
/// one per direction, each with its own deadline bookkeeping. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub counterpart_id: i64,
    pub tag: String,
    pub match_basis: String,

    // Geo context captured at match time.
    pub match_country: String,
    pub match_province: String,
    pub match_city: String,
    pub match_district: String,

    pub status: String,
    pub connect_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user read projection of a match, carrying a contact snapshot taken at
/// match time and the user's own annotations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchResultRow {
    pub id: i64,
    pub user_id: i64,
    pub counterpart_id: i64,
    pub keyword: String,
    pub counterpart_email: String,
    pub remark: String,
    pub is_known: bool,
    pub notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub matched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A directed "connected" relationship, created in pairs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendEdgeRow {
    pub id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A standing keyword subscription that accumulates match counts while active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchListRow {
    pub id: i64,
    pub user_id: i64,
    pub keyword: String,
    pub duration_days: i32,
    pub cost_coins: i64,
    pub status: String,
    pub expire_at: DateTime<Utc>,
    pub match_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Matched,
    FriendAdded,
    Missed,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::FriendAdded => "friend_added",
            MatchStatus::Missed => "missed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "matched" => Some(MatchStatus::Matched),
            "friend_added" => Some(MatchStatus::FriendAdded),
            "missed" => Some(MatchStatus::Missed),
            _ => None,
        }
    }

    /// `friend_added` and `missed` are final; only `matched` may transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Matched)
    }

    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        !self.is_terminal() && next != MatchStatus::Matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_round_trip() {
        for status in [
            MatchStatus::Matched,
            MatchStatus::FriendAdded,
            MatchStatus::Missed,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_terminal_states_cannot_transition() {
        assert!(!MatchStatus::FriendAdded.can_transition_to(MatchStatus::Missed));
        assert!(!MatchStatus::Missed.can_transition_to(MatchStatus::FriendAdded));
        assert!(MatchStatus::FriendAdded.is_terminal());
        assert!(MatchStatus::Missed.is_terminal());
    }

    #[test]
    fn test_matched_resolves_either_way() {
        assert!(MatchStatus::Matched.can_transition_to(MatchStatus::FriendAdded));
        assert!(MatchStatus::Matched.can_transition_to(MatchStatus::Missed));
        assert!(!MatchStatus::Matched.can_transition_to(MatchStatus::Matched));
    }
}
