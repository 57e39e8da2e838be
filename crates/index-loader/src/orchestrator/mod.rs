//! Bulk load orchestration.
//!
//! The [`BulkLoader`] drives one run:
//!
//! ```text
//! SELECT_READER -> [READ -> RESHAPE -> DISPATCH -> (BACKUP) -> ADVANCE]* -> SELECT_READER -> ... -> DONE
//! ```
//!
//! - An empty page ends the current reader.
//! - Any read, reshape or dispatch failure aborts the run with the reader's
//!   source id and page number attached.
//! - Dispatch returns as soon as the bulk request is issued; completion is
//!   observed through the [`ResultQueue`](crate::queue::ResultQueue) and the
//!   returned [`DispatchHandle`]s.
//! - Backups are spawned and never awaited. Their failures are logged and
//!   counted but never abort the run.
//!
//! Pages of one reader are dispatched strictly in page order. Only one page
//! of raw documents is held in memory at a time.

mod report;

pub use report::{CompletionSummary, LoadOutcome, LoadSummary};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BulkConfig;
use crate::core::{
    BackupStore, BulkSink, DataSource, DispatchHandle, DocumentReader, PagingCriteria,
    ReshapedBatch,
};
use crate::error::{LoadError, PipelinePhase, Result};
use crate::reshape::Reshaper;
use crate::schema::SchemaSet;

/// Correlation id of a batch: `"{source}_{page}"`.
pub fn correlation_id(source_id: &str, page: i64) -> String {
    format!("{}_{}", source_id, page)
}

/// Pages documents out of a source and into a bulk sink.
pub struct BulkLoader {
    config: BulkConfig,
    schema: Arc<SchemaSet>,
    reshaper: Reshaper,
    sink: Arc<dyn BulkSink>,
    backup: Option<Arc<dyn BackupStore>>,
    backup_failures: Arc<AtomicU64>,
}

impl BulkLoader {
    /// Create a loader.
    pub fn new(
        config: BulkConfig,
        schema: SchemaSet,
        reshaper: Reshaper,
        sink: Arc<dyn BulkSink>,
    ) -> Result<Self> {
        if config.max_elements_per_bulk <= 0 {
            return Err(LoadError::Config(
                "bulk.max_elements_per_bulk must be at least 1".into(),
            ));
        }
        if schema.is_empty() {
            return Err(LoadError::Config(
                "schema must declare at least one field".into(),
            ));
        }
        Ok(Self {
            config,
            schema: Arc::new(schema),
            reshaper,
            sink,
            backup: None,
            backup_failures: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Also store every dispatched batch in `store`.
    pub fn with_backup(mut self, store: Arc<dyn BackupStore>) -> Self {
        self.backup = Some(store);
        self
    }

    /// Backups that have failed so far.
    ///
    /// Backups run detached, so this can still grow after `load` returns.
    pub fn backup_failures(&self) -> u64 {
        self.backup_failures.load(Ordering::Relaxed)
    }

    /// Schema used for reshaping.
    pub fn schema(&self) -> &SchemaSet {
        &self.schema
    }

    /// Run the load until the source is exhausted or `cancel` fires.
    ///
    /// Cancellation stops before the next page; batches already dispatched
    /// are still returned so the caller can wait for them.
    pub async fn load(
        &self,
        source: &mut dyn DataSource,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome> {
        let started = Instant::now();
        let mut summary = LoadSummary::new(Uuid::new_v4().to_string(), Utc::now());
        let mut handles = Vec::new();

        info!(
            "Starting load {} ({} fields, {} documents per bulk)",
            summary.run_id,
            self.schema.len(),
            self.config.max_elements_per_bulk
        );

        while source.has_next() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let mut reader = source.next_reader().await?;
            info!("Loading {}", reader.source_id());
            let finished = self
                .load_reader(reader.as_mut(), cancel, &mut summary, &mut handles)
                .await?;
            summary.readers += 1;
            if !finished {
                summary.cancelled = true;
                break;
            }
        }

        summary.finish(Utc::now(), started.elapsed());
        if summary.cancelled {
            warn!(
                "Load {} cancelled after {} batches",
                summary.run_id, summary.batches_dispatched
            );
        } else {
            info!(
                "Load {} dispatched {} documents in {} batches from {} readers ({:.2}s)",
                summary.run_id,
                summary.documents_dispatched,
                summary.batches_dispatched,
                summary.readers,
                summary.duration_seconds
            );
        }

        Ok(LoadOutcome { summary, handles })
    }

    /// Page through one reader. Returns `false` if cancelled midway.
    async fn load_reader(
        &self,
        reader: &mut dyn DocumentReader,
        cancel: &CancellationToken,
        summary: &mut LoadSummary,
        handles: &mut Vec<DispatchHandle>,
    ) -> Result<bool> {
        let source_id = reader.source_id().to_string();
        let mut criteria = PagingCriteria::from_beginning(self.config.max_elements_per_bulk)?;

        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            let page = criteria.page();

            let documents = reader
                .read(&criteria)
                .await
                .map_err(|e| LoadError::pipeline(&source_id, page, PipelinePhase::Read, e))?;
            if documents.is_empty() {
                debug!("{} exhausted after {} pages", source_id, page);
                return Ok(true);
            }
            if documents.len() as i64 > criteria.size() {
                return Err(LoadError::pipeline(
                    &source_id,
                    page,
                    PipelinePhase::Read,
                    LoadError::Reader(format!(
                        "returned {} documents for a page of {}",
                        documents.len(),
                        criteria.size()
                    )),
                ));
            }
            summary.pages += 1;
            summary.documents_read += documents.len() as u64;

            let batch = self
                .reshaper
                .reshape(&documents, &self.schema)
                .map_err(|e| LoadError::pipeline(&source_id, page, PipelinePhase::Reshape, e))?;
            drop(documents);

            if !batch.is_empty() {
                let id = correlation_id(&source_id, page);
                let batch = Arc::new(batch);
                let handle = self
                    .sink
                    .dispatch(&id, Arc::clone(&batch))
                    .await
                    .map_err(|e| {
                        LoadError::pipeline(&source_id, page, PipelinePhase::Dispatch, e)
                    })?;
                debug!("Dispatched {} ({} documents)", id, batch.len());

                summary.batches_dispatched += 1;
                summary.documents_dispatched += batch.len() as u64;
                handles.push(handle);

                if let Some(store) = &self.backup {
                    self.spawn_backup(Arc::clone(store), id.clone(), batch);
                }
                summary.correlation_ids.push(id);
            }

            criteria = criteria.next_page();
        }
    }

    fn spawn_backup(
        &self,
        store: Arc<dyn BackupStore>,
        identifier: String,
        batch: Arc<ReshapedBatch>,
    ) {
        let failures = Arc::clone(&self.backup_failures);
        tokio::spawn(async move {
            let result = store.store(&identifier, batch).await;
            if !result.stored {
                failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Backup of {} failed: {}",
                    identifier,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        });
    }
}
