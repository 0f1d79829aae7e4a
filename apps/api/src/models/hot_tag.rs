use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Aggregated popularity counters for a keyword.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HotTagRow {
    pub id: i64,
    pub keyword: String,
    pub count_24h: i32,
    pub count_total: i32,
    pub submit_count: i32,
    pub status: String,
    pub last_search_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagVisibility {
    /// Promoted by an operator; eligible for top-N listings and counting.
    Show,
    /// Default for lazily created keywords; accrues nothing until promoted.
    Hide,
    /// Suppressed outright.
    Blackhole,
}

impl TagVisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            TagVisibility::Show => "show",
            TagVisibility::Hide => "hide",
            TagVisibility::Blackhole => "blackhole",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "show" => Some(TagVisibility::Show),
            "hide" => Some(TagVisibility::Hide),
            "blackhole" => Some(TagVisibility::Blackhole),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_round_trip() {
        for status in [
            TagVisibility::Show,
            TagVisibility::Hide,
            TagVisibility::Blackhole,
        ] {
            assert_eq!(TagVisibility::parse(status.as_str()), Some(status));
        }
        assert_eq!(TagVisibility::parse(""), None);
    }
}
