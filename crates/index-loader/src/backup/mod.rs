//! Backup stores for dispatched batches.

mod json;

pub use json::JsonFileStore;
