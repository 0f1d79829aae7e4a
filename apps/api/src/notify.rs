//! Notification collaborator boundary.
//!
//! Delivery (email/SMS providers) lives outside this service. The engine only
//! knows the `Notifier` trait; failures are logged by callers and never block
//! or unwind match state.
//!
//! `AppState` holds an `Arc<dyn Notifier>`, swapped at startup.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Pushes a match notification carrying the counterpart's contact snapshot.
    async fn send_match_notification(
        &self,
        user_id: i64,
        counterpart_contact: &str,
        keyword: &str,
    ) -> anyhow::Result<()>;
}

/// Default backend: records the would-be delivery in the log stream.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_match_notification(
        &self,
        user_id: i64,
        counterpart_contact: &str,
        keyword: &str,
    ) -> anyhow::Result<()> {
        info!(
            user_id,
            keyword,
            contact = counterpart_contact,
            "match notification dispatched"
        );
        Ok(())
    }
}
