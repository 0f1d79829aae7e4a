//! Background lifecycle loops: TTL expiry, deadline resolution, the nightly
//! 24h-counter reset, and the full-sweep matcher backstop.
//!
//! Each loop runs independently on its own interval and does one bounded
//! tick at a time. Ticks only log on failure: every action here is
//! idempotent or safely re-evaluated on the next tick, so there is nobody
//! to surface an error to. Shutdown is a watch signal; a tick in flight
//! finishes before its task exits.

use chrono::{DateTime, Local, TimeZone};
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::hot_tags;
use crate::matching::{self, connect};
use crate::models::matching::MatchRecordRow;
use crate::models::posting::PostingStatus;
use crate::state::AppState;

pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the four loops. Call `stop` to wind them down.
    pub fn start(state: AppState) -> Self {
        let (shutdown, _) = watch::channel(false);

        let handles = vec![
            spawn_interval_loop(
                "expire",
                state.clone(),
                shutdown.subscribe(),
                state.config.expire_interval_secs,
                |s| async move { expire_tick(&s.db).await },
            ),
            spawn_interval_loop(
                "resolve",
                state.clone(),
                shutdown.subscribe(),
                state.config.resolve_interval_secs,
                |s| async move { resolve_tick(&s.db).await },
            ),
            spawn_interval_loop(
                "full-sweep",
                state.clone(),
                shutdown.subscribe(),
                state.config.sweep_interval_secs,
                |s| async move {
                    matching::run_full_sweep(&s.db, s.config.connect_window_hours)
                        .await
                        .map(|_| ())
                },
            ),
            spawn_daily_reset_loop(state, shutdown.subscribe()),
        ];

        info!("lifecycle scheduler started");
        Self { shutdown, handles }
    }

    /// Signals every loop and waits for in-flight ticks to complete.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "scheduler task join failed");
            }
        }
        info!("lifecycle scheduler stopped");
    }
}

fn spawn_interval_loop<F, Fut>(
    name: &'static str,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
    interval_secs: u64,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn(AppState) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), AppError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick of tokio's interval fires immediately; skip it so
        // startup is not a thundering herd of sweeps.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = tick(state.clone()).await {
                        error!(loop_name = name, error = %e, "scheduler tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!(loop_name = name, "scheduler loop shutting down");
                    break;
                }
            }
        }
    })
}

/// The nightly reset sleeps until the next local midnight each iteration,
/// rather than ticking on a fixed phase from process start.
fn spawn_daily_reset_loop(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = delay_until_next_midnight(Local::now());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    match hot_tags::reset_24h(&state.db).await {
                        Ok(reset) => info!(reset, "24h hot tag counters reset"),
                        Err(e) => error!(error = %e, "24h counter reset failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!(loop_name = "daily-reset", "scheduler loop shutting down");
                    break;
                }
            }
        }
    })
}

/// How long to sleep so the next wake-up lands on local midnight.
fn delay_until_next_midnight(now: DateTime<Local>) -> std::time::Duration {
    let tomorrow = now.date_naive() + chrono::Duration::days(1);
    let midnight = Local
        .from_local_datetime(&tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default())
        .earliest()
        .unwrap_or(now);
    (midnight - now).to_std().unwrap_or_default()
}

/// Bulk-expires postings and match lists whose TTL has passed.
async fn expire_tick(pool: &PgPool) -> Result<(), AppError> {
    let postings = sqlx::query(
        "UPDATE postings SET status = $1, updated_at = NOW()
         WHERE status = $2 AND expires_at < NOW()",
    )
    .bind(PostingStatus::Expired.as_str())
    .bind(PostingStatus::Active.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    let lists = sqlx::query(
        "UPDATE match_lists SET status = 'expired', updated_at = NOW()
         WHERE status = 'active' AND expire_at < NOW()",
    )
    .execute(pool)
    .await?
    .rows_affected();

    if postings > 0 || lists > 0 {
        info!(postings, lists, "expired stale postings and lists");
    }
    Ok(())
}

/// Resolves every `matched` record past its deadline into a terminal state:
/// `friend_added` when both parties allow passive addition, `missed`
/// otherwise. Per-record failures are logged with the record id and the
/// attempted transition, then skipped; the record is re-evaluated next tick.
async fn resolve_tick(pool: &PgPool) -> Result<(), AppError> {
    let due: Vec<MatchRecordRow> = sqlx::query_as(
        "SELECT * FROM match_records WHERE status = 'matched' AND connect_deadline < NOW()",
    )
    .fetch_all(pool)
    .await?;

    if due.is_empty() {
        return Ok(());
    }
    info!(due = due.len(), "resolving match records past deadline");

    for record in &due {
        if let Err(e) = resolve_record(pool, record).await {
            warn!(
                match_id = record.id,
                error = %e,
                "deadline resolution failed, will retry next tick"
            );
        }
    }
    Ok(())
}

async fn resolve_record(pool: &PgPool, record: &MatchRecordRow) -> Result<(), AppError> {
    // A missing user counts as not opted in.
    let both_allow: bool = sqlx::query_scalar(
        "SELECT COUNT(*) = 2 FROM users WHERE id IN ($1, $2) AND allow_passive_add",
    )
    .bind(record.user_id)
    .bind(record.counterpart_id)
    .fetch_one(pool)
    .await?;

    if both_allow {
        let mut tx = pool.begin().await?;
        connect::create_edge_pair(&mut *tx, record.user_id, record.counterpart_id).await?;
        sqlx::query(
            "UPDATE match_records SET status = 'friend_added', updated_at = NOW()
             WHERE id = $1 AND status = 'matched'",
        )
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(
            match_id = record.id,
            user_id = record.user_id,
            counterpart_id = record.counterpart_id,
            "match auto-connected on deadline"
        );
    } else {
        sqlx::query(
            "UPDATE match_records SET status = 'missed', updated_at = NOW()
             WHERE id = $1 AND status = 'matched'",
        )
        .bind(record.id)
        .execute(pool)
        .await?;
        info!(match_id = record.id, "match missed its deadline");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, mo, d)
                    .unwrap()
                    .and_hms_opt(h, mi, s)
                    .unwrap(),
            )
            .earliest()
            .unwrap()
    }

    #[test]
    fn test_delay_reaches_next_midnight() {
        let now = local(2026, 3, 9, 23, 0, 0);
        let delay = delay_until_next_midnight(now);
        let wake = now + chrono::Duration::from_std(delay).unwrap();
        assert_eq!(wake.hour(), 0);
        assert_eq!(wake.minute(), 0);
        assert_eq!(wake.date_naive(), now.date_naive() + chrono::Duration::days(1));
    }

    #[test]
    fn test_delay_just_after_midnight_waits_a_full_day() {
        let now = local(2026, 3, 9, 0, 0, 1);
        let delay = delay_until_next_midnight(now);
        // Just under 24h, never a few seconds.
        assert!(delay > std::time::Duration::from_secs(20 * 3600));
    }

    #[test]
    fn test_delay_is_never_zero_sized_day() {
        let now = local(2026, 6, 1, 12, 30, 0);
        let delay = delay_until_next_midnight(now);
        assert!(delay > std::time::Duration::ZERO);
        assert!(delay <= std::time::Duration::from_secs(24 * 3600));
    }
}
