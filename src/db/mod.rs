pub mod connection;
pub mod event;
pub mod migration;
pub mod reference;

use crate::models::{CatalogKind, CatalogRecord, EventKey, RawEvent};
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Filtered view over stored events.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub owners: Vec<String>,
    pub chain: Option<String>,
    pub include_scam: bool,
}

/// Persistence primitives needed by sync and reconstruction. Any backing
/// technology that can insert-if-absent, upsert by key and run a filtered,
/// ordered, windowed scan can implement it.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn event_exists(&self, key: EventKey<'_>) -> Result<bool, StoreError>;

    /// Returns whether a row was actually written.
    async fn insert_event_if_absent(&self, event: &RawEvent) -> Result<bool, StoreError>;

    /// Inserts a page of events atomically; returns how many were new.
    async fn insert_events(&self, events: &[RawEvent]) -> Result<usize, StoreError>;

    /// Timestamp descending, nulls last, insertion order on ties.
    async fn fetch_events(&self, query: &EventQuery, offset: i64, limit: i64) -> Result<Vec<RawEvent>, StoreError>;

    /// Insert, or overwrite every field of the existing row with the same key.
    async fn upsert_by_key(&self, record: &CatalogRecord) -> Result<(), StoreError>;

    /// Records for the ids that exist; unknown ids are simply missing.
    async fn resolve_many(&self, kind: CatalogKind, ids: &[String]) -> Result<Vec<CatalogRecord>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn event_exists(&self, key: EventKey<'_>) -> Result<bool, StoreError> {
        event::event_exists(&self.pool, key).await
    }

    async fn insert_event_if_absent(&self, event: &RawEvent) -> Result<bool, StoreError> {
        event::insert_event(&self.pool, event).await
    }

    async fn insert_events(&self, events: &[RawEvent]) -> Result<usize, StoreError> {
        event::insert_events(&self.pool, events).await
    }

    async fn fetch_events(&self, query: &EventQuery, offset: i64, limit: i64) -> Result<Vec<RawEvent>, StoreError> {
        event::fetch_events(&self.pool, query, offset, limit).await
    }

    async fn upsert_by_key(&self, record: &CatalogRecord) -> Result<(), StoreError> {
        match record {
            CatalogRecord::Project(project) => reference::upsert_project(&self.pool, project).await,
            CatalogRecord::Token(token) => reference::upsert_token(&self.pool, token).await,
            CatalogRecord::Counterparty(counterparty) => {
                reference::upsert_counterparty(&self.pool, counterparty).await
            }
        }
    }

    async fn resolve_many(&self, kind: CatalogKind, ids: &[String]) -> Result<Vec<CatalogRecord>, StoreError> {
        let records = match kind {
            CatalogKind::Project => reference::get_projects(&self.pool, ids)
                .await?
                .into_iter()
                .map(CatalogRecord::Project)
                .collect(),
            CatalogKind::Token => reference::get_tokens(&self.pool, ids)
                .await?
                .into_iter()
                .map(CatalogRecord::Token)
                .collect(),
            CatalogKind::Counterparty => reference::get_counterparties(&self.pool, ids)
                .await?
                .into_iter()
                .map(CatalogRecord::Counterparty)
                .collect(),
        };

        Ok(records)
    }
}
