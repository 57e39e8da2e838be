//! Collaborator contracts consumed by the bulk loader.
//!
//! - [`DataSource`]: iterates over readers, one per logical source unit
//! - [`DocumentReader`]: paginated access to one unit (e.g. one file)
//! - [`BulkSink`]: asynchronous bulk-write destination
//! - [`BackupStore`]: optional secondary copy of every dispatched batch
//!
//! The loader drives sources and readers from a single task, so they only need
//! to be `Send`. Sinks and backup stores are shared with spawned tasks and must
//! be `Send + Sync`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{LoadError, Result};

use super::document::{Document, ReshapedBatch};
use super::paging::PagingCriteria;

/// Iterator over readers.
#[async_trait]
pub trait DataSource: Send {
    /// Whether another reader is available.
    fn has_next(&self) -> bool;

    /// Open the next reader.
    ///
    /// Only called after [`has_next`](DataSource::has_next) returned `true`.
    async fn next_reader(&mut self) -> Result<Box<dyn DocumentReader>>;
}

/// Paginated accessor over one logical data source unit.
#[async_trait]
pub trait DocumentReader: Send {
    /// Stable identifier used in logs, errors and correlation ids.
    fn source_id(&self) -> &str;

    /// Read the documents inside the window described by `criteria`.
    ///
    /// Returns at most `criteria.size()` documents. An empty list means the
    /// reader is exhausted.
    async fn read(&mut self, criteria: &PagingCriteria) -> Result<Vec<Document>>;
}

/// Bulk-write destination.
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Hand a batch to the sink and return without waiting for the write.
    ///
    /// An `Err` means the batch could not even be issued. Once a handle is
    /// returned the sink reports exactly one completion for it.
    async fn dispatch(&self, correlation_id: &str, batch: Arc<ReshapedBatch>)
        -> Result<DispatchHandle>;
}

/// Optional secondary store for dispatched batches.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Persist a batch under `identifier`. Failures are reported, never raised.
    async fn store(&self, identifier: &str, batch: Arc<ReshapedBatch>) -> StoreResult;
}

/// Outcome of a backup write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreResult {
    /// Whether the batch was stored.
    pub stored: bool,
    /// Failure cause when not stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreResult {
    /// A successful store.
    pub fn success() -> Self {
        Self {
            stored: true,
            error: None,
        }
    }

    /// A failed store with its cause.
    pub fn failure(cause: impl fmt::Display) -> Self {
        Self {
            stored: false,
            error: Some(cause.to_string()),
        }
    }
}

/// Handle to an in-flight bulk dispatch.
///
/// Resolves to `true` when every document was accepted, `false` when the
/// sink answered but rejected some documents, or an error when the write
/// itself failed.
pub struct DispatchHandle {
    correlation_id: String,
    task: JoinHandle<Result<bool>>,
}

impl DispatchHandle {
    /// Run `write` on the runtime and track it under `correlation_id`.
    pub fn spawn<F>(correlation_id: impl Into<String>, write: F) -> Self
    where
        F: Future<Output = Result<bool>> + Send + 'static,
    {
        Self {
            correlation_id: correlation_id.into(),
            task: tokio::spawn(write),
        }
    }

    /// A handle that is already complete.
    pub fn completed(correlation_id: impl Into<String>, acknowledged: bool) -> Self {
        Self::spawn(correlation_id, async move { Ok(acknowledged) })
    }

    /// Correlation id of the batch this handle tracks.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Whether the dispatch has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the dispatch to finish.
    ///
    /// Not finishing within `timeout` is fatal: the caller gets
    /// [`LoadError::Timeout`] rather than a silent retry.
    pub async fn wait(self, timeout: Duration) -> Result<bool> {
        let Self {
            correlation_id,
            task,
        } = self;
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(LoadError::Sink(format!(
                "dispatch task for {} did not complete: {}",
                correlation_id, e
            ))),
            Err(_) => Err(LoadError::timeout(
                format!("dispatch {}", correlation_id),
                timeout,
            )),
        }
    }
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("correlation_id", &self.correlation_id)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
