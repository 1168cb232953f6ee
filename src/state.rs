use crate::cache;
use crate::catalog::ReferenceCatalog;
use crate::config::Config;
use crate::db::{HistoryStore, SqliteStore};
use crate::feed::HistoryFeed;
use crate::history::HistoryReader;
use crate::sync::SyncDriver;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<ReferenceCatalog>,
    pub sync: Arc<SyncDriver>,
    pub history: HistoryReader,
}

impl AppState {
    /// Wires the catalog, sync driver and history reader over one SQLite pool.
    pub fn new(
        config: Config,
        db_pool: SqlitePool,
        feed: Arc<dyn HistoryFeed>,
        shutdown: CancellationToken,
    ) -> Self {
        let store: Arc<dyn HistoryStore> = Arc::new(SqliteStore::new(db_pool));
        let catalog = Arc::new(ReferenceCatalog::new(store.clone(), cache::init_cache(&config)));
        let sync = Arc::new(SyncDriver::new(
            feed,
            store.clone(),
            catalog.clone(),
            config.sync_concurrency,
            shutdown,
        ));
        let history = HistoryReader::new(store, catalog.clone());

        Self {
            config,
            catalog,
            sync,
            history,
        }
    }
}
