//! Load results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::DispatchHandle;
use crate::error::{LoadError, Result};

/// Summary of a load run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Unique run identifier.
    pub run_id: String,

    /// When the load started.
    pub started_at: DateTime<Utc>,

    /// When the last page was dispatched.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Readers opened.
    pub readers: u64,

    /// Non-empty pages read.
    pub pages: u64,

    /// Raw documents read.
    pub documents_read: u64,

    /// Documents handed to the sink.
    pub documents_dispatched: u64,

    /// Bulk requests issued.
    pub batches_dispatched: u64,

    /// Correlation ids in dispatch order.
    pub correlation_ids: Vec<String>,

    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

impl LoadSummary {
    pub(crate) fn new(run_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            completed_at: started_at,
            duration_seconds: 0.0,
            readers: 0,
            pages: 0,
            documents_read: 0,
            documents_dispatched: 0,
            batches_dispatched: 0,
            correlation_ids: Vec::new(),
            cancelled: false,
        }
    }

    pub(crate) fn finish(&mut self, completed_at: DateTime<Utc>, elapsed: Duration) {
        self.completed_at = completed_at;
        self.duration_seconds = elapsed.as_secs_f64();
    }

    /// Documents dispatched per second.
    pub fn documents_per_second(&self) -> u64 {
        if self.duration_seconds > 0.0 {
            (self.documents_dispatched as f64 / self.duration_seconds) as u64
        } else {
            self.documents_dispatched
        }
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How the in-flight dispatches of a run completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Requests where every document was accepted.
    pub acknowledged: u64,
    /// Requests where some documents were rejected.
    pub rejected: u64,
    /// Requests that failed outright.
    pub failed: u64,
}

impl CompletionSummary {
    /// Whether every request was fully accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// Summary plus the handles of every dispatched batch.
#[derive(Debug)]
pub struct LoadOutcome {
    pub summary: LoadSummary,
    pub handles: Vec<DispatchHandle>,
}

impl LoadOutcome {
    /// Wait for every dispatch, each bounded by `timeout`.
    ///
    /// Rejections and request failures are counted; their details are in the
    /// result queue. A dispatch still running after `timeout`, or one whose
    /// outcome could not be queued, fails the whole wait.
    pub async fn await_completion(self, timeout: Duration) -> Result<CompletionSummary> {
        let waits = self.handles.into_iter().map(|h| {
            let id = h.correlation_id().to_string();
            async move { (id, h.wait(timeout).await) }
        });

        let mut completion = CompletionSummary::default();
        for (id, outcome) in join_all(waits).await {
            match outcome {
                Ok(true) => completion.acknowledged += 1,
                Ok(false) => completion.rejected += 1,
                Err(e @ (LoadError::Timeout { .. } | LoadError::QueueOverflow { .. })) => {
                    return Err(e)
                }
                Err(e) => {
                    warn!("Bulk {} failed: {}", id, e);
                    completion.failed += 1;
                }
            }
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(handles: Vec<DispatchHandle>) -> LoadOutcome {
        LoadOutcome {
            summary: LoadSummary::new("run".into(), Utc::now()),
            handles,
        }
    }

    #[tokio::test]
    async fn test_counts_completions() {
        let handles = vec![
            DispatchHandle::completed("s_0", true),
            DispatchHandle::completed("s_1", false),
            DispatchHandle::spawn("s_2", async { Err(LoadError::Sink("503".into())) }),
        ];
        let completion = outcome(handles)
            .await_completion(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(
            completion,
            CompletionSummary {
                acknowledged: 1,
                rejected: 1,
                failed: 1
            }
        );
        assert!(!completion.is_clean());
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let handles = vec![DispatchHandle::spawn("s_0", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        })];
        let err = outcome(handles)
            .await_completion(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Timeout { .. }));
    }

    #[test]
    fn test_summary_serializes() {
        let summary = LoadSummary::new("abc".into(), Utc::now());
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"run_id\": \"abc\""));
        assert!(json.contains("\"cancelled\": false"));
    }
}
