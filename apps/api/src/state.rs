use std::sync::Arc;

use sqlx::PgPool;

use crate::audit::AuditGate;
use crate::config::Config;
use crate::notify::Notifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Audit gate for posting visibility. Default outcome comes from config;
    /// draining the pending queue is an explicit admin command, not a side
    /// effect of flipping the switch.
    pub audit: Arc<AuditGate>,
    /// Pluggable notification collaborator. Default: LogNotifier.
    pub notifier: Arc<dyn Notifier>,
}
