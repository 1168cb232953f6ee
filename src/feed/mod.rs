pub mod client;
pub mod models;

// Re-exports for convenience
pub use client::{DebankClient, FeedError, HistoryFeed};
pub use models::HistoryPage;
