pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod feed;
pub mod history;
pub mod models;
pub mod state;
pub mod sync;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::{create_router, ReadableHistoryQuery, SyncRequest};
pub use catalog::ReferenceCatalog;
pub use db::{HistoryStore, SqliteStore, StoreError};
pub use feed::{DebankClient, FeedError, HistoryFeed};
pub use history::{HistoryReader, HistoryRequest};
pub use models::{AddressSyncResult, ReadableTransaction, SyncStatus};
pub use sync::SyncDriver;
