pub mod hot_tag;
pub mod ledger;
pub mod matching;
pub mod posting;
pub mod user;

use serde::Deserialize;

/// Authenticated caller identity, supplied by the upstream session layer.
/// The engine trusts this without re-validating credentials.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

/// Common pagination parameters for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::default();
        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps_page_size() {
        let page = Pagination {
            page: 2,
            page_size: 5000,
        };
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 100);
    }

    #[test]
    fn test_pagination_negative_page_treated_as_first() {
        let page = Pagination {
            page: -3,
            page_size: 10,
        };
        assert_eq!(page.offset(), 0);
    }
}
