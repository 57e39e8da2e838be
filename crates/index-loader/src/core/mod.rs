//! Core abstractions shared by every stage of a load.
//!
//! - [`value`]: untyped document values with JVM-style numeric widths
//! - [`document`]: raw documents and reshaped batches
//! - [`paging`]: the immutable page/size read cursor
//! - [`traits`]: collaborator contracts for sources, readers, sinks and backup stores
//!
//! # Architecture
//!
//! Concrete collaborators live in [`crate::source`], [`crate::target`] and
//! [`crate::backup`]. The orchestrator only sees the traits defined here, so
//! tests can drive it with in-memory implementations.

pub mod document;
pub mod paging;
pub mod traits;
pub mod value;

pub use document::{Document, ReshapedBatch};
pub use paging::{PagingCriteria, DEFAULT_MAX_ELEMENTS};
pub use traits::{BackupStore, BulkSink, DataSource, DispatchHandle, DocumentReader, StoreResult};
pub use value::{Properties, Value};
