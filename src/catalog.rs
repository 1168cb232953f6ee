//! Reference catalog: projects, tokens and exchange counterparties used to
//! enrich raw events, backed by the store and fronted by a moka cache.

use crate::cache::{CatalogCache, CatalogKey};
use crate::db::{HistoryStore, StoreError};
use crate::feed::HistoryPage;
use crate::models::{CatalogKind, CatalogRecord, CounterpartyRef, ProjectRef, TokenRef};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReferenceCatalog {
    store: Arc<dyn HistoryStore>,
    cache: CatalogCache,
    // Bumped by every write or invalidation.
    generation: AtomicU64,
}

impl ReferenceCatalog {
    pub fn new(store: Arc<dyn HistoryStore>, cache: CatalogCache) -> Self {
        Self {
            store,
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Writes `record` through to the store, replacing every field of an
    /// existing entry, and drops the cached copy.
    pub async fn upsert(&self, record: CatalogRecord) -> Result<(), StoreError> {
        self.store.upsert_by_key(&record).await?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&CatalogKey::new(record.kind(), record.id())).await;
        Ok(())
    }

    /// Upserts every dictionary entry carried by a feed page. Returns the
    /// number of records written.
    pub async fn upsert_page(&self, page: &HistoryPage) -> Result<usize, StoreError> {
        let records: Vec<CatalogRecord> = page
            .projects()
            .map(CatalogRecord::Project)
            .chain(page.tokens().map(CatalogRecord::Token))
            .chain(page.counterparties().map(CatalogRecord::Counterparty))
            .collect();

        let count = records.len();
        for record in records {
            self.upsert(record).await?;
        }

        Ok(count)
    }

    /// Batch lookup. Ids unknown to the store are absent from the result.
    pub async fn resolve_many(
        &self,
        kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogRecord>, StoreError> {
        let mut resolved = HashMap::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();

        for id in ids {
            let key = CatalogKey::new(kind, id);
            if !seen.insert(key.id.clone()) {
                continue;
            }
            match self.cache.get(&key).await {
                Some(record) => {
                    resolved.insert(key.id, record);
                }
                None => misses.push(key.id),
            }
        }

        if !misses.is_empty() {
            debug!("Catalog cache miss for {} {} ids", misses.len(), kind);
            let generation = self.generation.load(Ordering::SeqCst);
            let mut cached = Vec::new();
            for record in self.store.resolve_many(kind, &misses).await? {
                let key = CatalogKey::new(kind, record.id());
                self.cache.insert(key.clone(), record.clone()).await;
                resolved.insert(key.id.clone(), record);
                cached.push(key);
            }

            // A write landed while loading: what was just cached may predate it.
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Catalog changed during lookup, dropping {} cached {} entries", cached.len(), kind);
                for key in &cached {
                    self.cache.invalidate(key).await;
                }
            }
        }

        Ok(resolved)
    }

    pub async fn resolve_tokens(&self, ids: &[String]) -> Result<HashMap<String, TokenRef>, StoreError> {
        Ok(self
            .resolve_many(CatalogKind::Token, ids)
            .await?
            .into_iter()
            .filter_map(|(id, record)| match record {
                CatalogRecord::Token(token) => Some((id, token)),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve_projects(&self, ids: &[String]) -> Result<HashMap<String, ProjectRef>, StoreError> {
        Ok(self
            .resolve_many(CatalogKind::Project, ids)
            .await?
            .into_iter()
            .filter_map(|(id, record)| match record {
                CatalogRecord::Project(project) => Some((id, project)),
                _ => None,
            })
            .collect())
    }

    /// Keys of the result are lower-cased addresses.
    pub async fn resolve_counterparties(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, CounterpartyRef>, StoreError> {
        Ok(self
            .resolve_many(CatalogKind::Counterparty, addresses)
            .await?
            .into_iter()
            .filter_map(|(address, record)| match record {
                CatalogRecord::Counterparty(counterparty) => Some((address, counterparty)),
                _ => None,
            })
            .collect())
    }

    /// Drops every cached entry; the next lookups go to the store.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        info!("Invalidated reference catalog cache");
    }

    /// Reloads the given entries from the store.
    pub async fn refresh(
        &self,
        kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogRecord>, StoreError> {
        for id in ids {
            self.cache.invalidate(&CatalogKey::new(kind, id)).await;
        }
        self.resolve_many(kind, ids).await
    }
}
