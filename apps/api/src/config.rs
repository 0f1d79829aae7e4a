use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,

    /// Whether new postings start in `pending` (true) or auto-`approved` (false).
    pub audit_enabled: bool,

    /// Coins charged for submitting, renewing, or resubmitting a posting.
    pub posting_cost: i64,
    /// Coins charged for a forced friend connection after the deadline.
    pub force_add_cost: i64,
    /// Coins charged for pushing a match notification to a counterpart.
    pub notify_cost: i64,

    /// Posting time-to-live in hours.
    pub posting_ttl_hours: i64,
    /// Window after a match within which an ordinary connect is allowed.
    pub connect_window_hours: i64,

    pub expire_interval_secs: u64,
    pub resolve_interval_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: env_or("PORT", "8080")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            audit_enabled: env_or("AUDIT_ENABLED", "false")?,
            posting_cost: env_or("POSTING_COST", "10")?,
            force_add_cost: env_or("FORCE_ADD_COST", "50")?,
            notify_cost: env_or("NOTIFY_COST", "1")?,
            posting_ttl_hours: env_or("POSTING_TTL_HOURS", "24")?,
            connect_window_hours: env_or("CONNECT_WINDOW_HOURS", "24")?,
            expire_interval_secs: env_or("EXPIRE_INTERVAL_SECS", "600")?,
            resolve_interval_secs: env_or("RESOLVE_INTERVAL_SECS", "1800")?,
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", "3600")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_uses_default() {
        let port: u16 = env_or("COLLIDE_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_env_or_rejects_garbage_default() {
        let parsed: Result<u16> = env_or("COLLIDE_TEST_UNSET_PORT", "not-a-port");
        assert!(parsed.is_err());
    }
}
