//! Periodic pruning of finished job records.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use super::JobStore;

/// Spawn a background task that removes finished records older than `retention`.
///
/// Sweeps every quarter of the retention window, at least once a second.
pub fn spawn_retention_sweeper(store: JobStore, retention: Duration) -> JoinHandle<()> {
    let period = (retention / 4).max(Duration::from_secs(1));
    let max_age = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);

    tracing::info!(
        retention_secs = retention.as_secs(),
        period_secs = period.as_secs(),
        "job retention sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let cutoff = Utc::now()
                .checked_sub_signed(max_age)
                .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
            let removed = store.prune_finished_before(cutoff);
            if removed > 0 {
                tracing::info!(removed, remaining = store.len(), "pruned finished jobs");
            }
        }
    })
}
