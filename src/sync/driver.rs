use crate::catalog::ReferenceCatalog;
use crate::db::{HistoryStore, StoreError};
use crate::feed::{FeedError, HistoryFeed, HistoryPage};
use crate::models::{AddressSyncResult, RawEvent, SyncStatus};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Failures that abort one address's sync loop.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What to do with one event of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventOutcome {
    Insert,
    /// Already stored, keep scanning (gap fill).
    Skip,
    /// Already stored, everything older is assumed stored too.
    CaughtUp,
}

pub struct SyncDriver {
    feed: Arc<dyn HistoryFeed>,
    store: Arc<dyn HistoryStore>,
    catalog: Arc<ReferenceCatalog>,
    concurrency: usize,
    shutdown: CancellationToken,
    address_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncDriver {
    pub fn new(
        feed: Arc<dyn HistoryFeed>,
        store: Arc<dyn HistoryStore>,
        catalog: Arc<ReferenceCatalog>,
        concurrency: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            feed,
            store,
            catalog,
            concurrency: concurrency.max(1),
            shutdown,
            address_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Syncs every distinct address, at most `concurrency` at a time. Results
    /// follow the order of first appearance in `addresses`.
    pub async fn sync_all(&self, addresses: &[String], resume_gaps: bool) -> Vec<AddressSyncResult> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = addresses
            .iter()
            .map(|address| normalize_address(address))
            .filter(|address| !address.is_empty() && seen.insert(address.clone()))
            .collect();

        info!(
            "Syncing history for {} addresses (resume_gaps: {}, concurrency: {})",
            unique.len(),
            resume_gaps,
            self.concurrency
        );

        stream::iter(unique)
            .map(|address| async move { self.sync_address(&address, resume_gaps).await })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Pages backwards through one address's history until it is exhausted,
    /// caught up with the store, or a page fails.
    pub async fn sync_address(&self, address: &str, resume_gaps: bool) -> AddressSyncResult {
        let address = normalize_address(address);

        // A second run for the same address waits for the first to finish.
        let lock = self.address_lock(&address).await;
        let _guard = lock.lock().await;

        let mut synced_count = 0;
        let outcome = self.run(&address, resume_gaps, &mut synced_count).await;

        match outcome {
            Ok(()) => {
                info!("Synced {} new events for {}", synced_count, address);
                AddressSyncResult {
                    address,
                    status: SyncStatus::Success,
                    synced_count,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Error syncing history for {} after {} new events: {}", address, synced_count, e);
                AddressSyncResult {
                    address,
                    status: SyncStatus::PartialError,
                    synced_count,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run(&self, address: &str, resume_gaps: bool, synced_count: &mut usize) -> Result<(), SyncError> {
        let mut cursor: Option<i64> = None;

        loop {
            let page = self.fetch_page(address, cursor).await?;

            if page.has_reference_data() {
                let upserted = self.catalog.upsert_page(&page).await?;
                debug!("Upserted {} reference entries from page of {}", upserted, address);
            }

            let Some(oldest) = page.history_list.last() else {
                debug!("History exhausted for {}", address);
                return Ok(());
            };

            let (batch, caught_up) = self.collect_new_events(address, &page, resume_gaps).await?;
            if !batch.is_empty() {
                *synced_count += self.store.insert_events(&batch).await?;
            }

            if caught_up {
                debug!("Caught up with stored history for {}", address);
                return Ok(());
            }

            match oldest.timestamp() {
                // The cursor must move strictly backwards or the feed would
                // hand out the same page forever.
                Some(next) if cursor.map_or(true, |current| next < current) => cursor = Some(next),
                Some(next) => {
                    warn!("Cursor for {} did not advance ({} after {:?}), stopping", address, next, cursor);
                    return Ok(());
                }
                None => {
                    debug!("Oldest event for {} has no timestamp, cannot page further", address);
                    return Ok(());
                }
            }
        }
    }

    async fn fetch_page(&self, address: &str, cursor: Option<i64>) -> Result<HistoryPage, FeedError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(FeedError::Cancelled),
            page = self.feed.fetch_page(address, cursor) => page,
        }
    }

    /// Events of `page` that still need inserting, and whether scanning hit an
    /// already stored event in catch-up mode.
    async fn collect_new_events(
        &self,
        address: &str,
        page: &HistoryPage,
        resume_gaps: bool,
    ) -> Result<(Vec<RawEvent>, bool), StoreError> {
        let mut batch = Vec::new();

        for item in &page.history_list {
            let Some(event) = RawEvent::from_item(address, item) else {
                debug!("Skipping history item without id or chain for {}", address);
                continue;
            };

            match self.classify(&event, resume_gaps).await? {
                EventOutcome::Insert => batch.push(event),
                EventOutcome::Skip => continue,
                EventOutcome::CaughtUp => return Ok((batch, true)),
            }
        }

        Ok((batch, false))
    }

    async fn classify(&self, event: &RawEvent, resume_gaps: bool) -> Result<EventOutcome, StoreError> {
        if !self.store.event_exists(event.key()).await? {
            return Ok(EventOutcome::Insert);
        }

        Ok(if resume_gaps {
            EventOutcome::Skip
        } else {
            EventOutcome::CaughtUp
        })
    }

    async fn address_lock(&self, address: &str) -> Arc<Mutex<()>> {
        let mut locks = self.address_locks.lock().await;
        locks
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}
