pub mod driver;
pub mod polling;

// Re-exports for convenience
pub use driver::{SyncDriver, SyncError};
pub use polling::start_scheduled_sync;
