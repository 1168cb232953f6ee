pub mod classify;
pub mod reconstruct;

pub use reconstruct::{HistoryReader, HistoryRequest};
