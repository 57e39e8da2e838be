//! Search backend sinks.
//!
//! [`ElasticSink`] speaks the Elasticsearch `_bulk` API. It serializes a
//! batch up front, spawns the HTTP request, and hands the response to a
//! [`BulkListener`] that records exactly one [`PendingResult`] per dispatch.
//!
//! [`PendingResult`]: crate::queue::PendingResult

mod elastic;
mod listener;

pub use elastic::ElasticSink;
pub use listener::{BulkItem, BulkItemError, BulkListener, BulkResponse};
