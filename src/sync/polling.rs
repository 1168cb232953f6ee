use crate::config::MIN_SYNC_INTERVAL;
use crate::models::SyncStatus;
use crate::sync::driver::SyncDriver;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Periodically syncs the configured addresses in catch-up mode until
/// `shutdown` fires.
pub async fn start_scheduled_sync(
    driver: Arc<SyncDriver>,
    addresses: Vec<String>,
    every: Duration,
    run_on_startup: bool,
    shutdown: CancellationToken,
) {
    if addresses.is_empty() {
        warn!("No tracked addresses configured, scheduled sync disabled");
        return;
    }

    info!(
        "Starting scheduled history sync for {} addresses every {:?}",
        addresses.len(),
        every
    );

    let mut ticker = interval(every.max(MIN_SYNC_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately.
    if !run_on_startup {
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let results = driver.sync_all(&addresses, false).await;
                let synced: usize = results.iter().map(|r| r.synced_count).sum();
                let failed = results
                    .iter()
                    .filter(|r| r.status == SyncStatus::PartialError)
                    .count();

                if failed > 0 {
                    warn!("Scheduled sync stored {} new events, {} addresses failed", synced, failed);
                } else {
                    info!("Scheduled sync stored {} new events", synced);
                }
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down scheduled history sync");
                break;
            }
        }
    }
}
