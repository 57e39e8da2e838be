//! Completion handling for bulk requests.

use std::collections::HashMap;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::queue::{ItemError, ItemOutcome, PendingResult, ResultQueue};

/// Body of a `_bulk` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResponse {
    /// Server-side time in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether any item failed.
    #[serde(default)]
    pub errors: bool,
    /// One single-key map per document, keyed by action.
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

/// One document's entry in a bulk response.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Error entry of a rejected document.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

/// Turns the completion of one bulk request into a queued [`PendingResult`].
#[derive(Debug)]
pub struct BulkListener {
    correlation_id: String,
    request_id: String,
    index: String,
    started: Instant,
    queue: ResultQueue,
}

impl BulkListener {
    pub fn new(
        correlation_id: impl Into<String>,
        request_id: impl Into<String>,
        index: impl Into<String>,
        queue: ResultQueue,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            request_id: request_id.into(),
            index: index.into(),
            started: Instant::now(),
            queue,
        }
    }

    /// Record the outcome of the request.
    ///
    /// Returns whether every document was accepted. A failed request is
    /// recorded and then returned as the error. Failing to record is itself
    /// an error, since the outcome would otherwise be lost.
    pub async fn complete(self, outcome: Result<BulkResponse>) -> Result<bool> {
        match outcome {
            Ok(response) => {
                let result = self.to_result(response);
                let acknowledged = result.is_success();
                if acknowledged {
                    debug!(
                        "Bulk {} indexed {} documents in {:?}",
                        result.correlation_id,
                        result.items.len(),
                        result.elapsed
                    );
                } else {
                    warn!(
                        "Bulk {}: {} of {} documents rejected",
                        result.correlation_id,
                        result.failed_items().count(),
                        result.items.len()
                    );
                }
                self.queue.record(result).await?;
                Ok(acknowledged)
            }
            Err(e) => {
                warn!("Bulk {} failed: {}", self.correlation_id, e);
                let result = PendingResult {
                    correlation_id: self.correlation_id.clone(),
                    request_id: self.request_id.clone(),
                    index: self.index.clone(),
                    elapsed: self.started.elapsed(),
                    items: Vec::new(),
                    failure: Some(e.to_string()),
                };
                self.queue.record(result).await?;
                Err(e)
            }
        }
    }

    fn to_result(&self, response: BulkResponse) -> PendingResult {
        let items = response
            .items
            .into_iter()
            .flat_map(|entry| entry.into_iter())
            .map(|(action, item)| ItemOutcome {
                id: item.id,
                action,
                status: item.status,
                error: item.error.map(|e| ItemError {
                    kind: e.kind,
                    reason: e.reason,
                }),
            })
            .collect();
        PendingResult {
            correlation_id: self.correlation_id.clone(),
            request_id: self.request_id.clone(),
            index: self.index.clone(),
            elapsed: self.started.elapsed(),
            items,
            failure: None,
        }
    }
}
