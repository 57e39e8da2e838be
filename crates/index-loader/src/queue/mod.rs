//! Buffer of asynchronous bulk outcomes.
//!
//! Sinks complete on their own tasks; the [`ResultQueue`] is the only place
//! those completions become visible to a consumer. Two modes:
//!
//! - **Unbounded**: `add` always succeeds and `drain` waits until an outcome
//!   is available.
//! - **Bounded**: fixed capacity and a single timeout applied to both `add`
//!   and `drain`. A full queue that stays full for the timeout rejects the
//!   outcome.
//!
//! Ordering is FIFO by insertion. Completion order does not follow dispatch
//! order, so consumers match outcomes to batches by correlation id.

use std::time::Duration;

use serde::Serialize;

use crate::config::QueueConfig;
use crate::error::{LoadError, Result};

/// Error reported for one document in a bulk response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    /// Backend error type, e.g. `mapper_parsing_exception`.
    pub kind: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Per-document outcome of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// Document id assigned by the backend.
    pub id: Option<String>,
    /// Bulk action, e.g. `index`.
    pub action: String,
    /// HTTP-style status of the item.
    pub status: u16,
    /// Error when the item was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of one asynchronous dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingResult {
    /// `"{source}_{page}"` of the batch.
    pub correlation_id: String,
    /// Identifier of the bulk request.
    pub request_id: String,
    /// Target index.
    pub index: String,
    /// Time from dispatch to completion.
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Per-document outcomes, empty when the whole request failed.
    pub items: Vec<ItemOutcome>,
    /// Cause when the whole request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PendingResult {
    /// Whether the request failed or any document was rejected.
    pub fn has_failures(&self) -> bool {
        self.failure.is_some() || self.items.iter().any(ItemOutcome::is_failure)
    }

    /// Whether every document was accepted.
    pub fn is_success(&self) -> bool {
        !self.has_failures()
    }

    /// Rejected documents.
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|i| i.is_failure())
    }
}

fn serialize_millis<S: serde::Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Thread-safe, optionally bounded FIFO of [`PendingResult`]s.
///
/// Cloning shares the same underlying queue.
#[derive(Debug, Clone)]
pub struct ResultQueue {
    tx: async_channel::Sender<PendingResult>,
    rx: async_channel::Receiver<PendingResult>,
    timeout: Option<Duration>,
}

impl ResultQueue {
    /// A queue with no capacity limit and no timeout.
    pub fn unbounded() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self {
            tx,
            rx,
            timeout: None,
        }
    }

    /// A queue holding at most `capacity` results, waiting at most `timeout`
    /// on insertion and removal.
    pub fn bounded(capacity: usize, timeout: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(LoadError::Config(
                "queue capacity must be at least 1 for a bounded queue".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(LoadError::Config(
                "queue timeout must be positive for a bounded queue".into(),
            ));
        }
        let (tx, rx) = async_channel::bounded(capacity);
        Ok(Self {
            tx,
            rx,
            timeout: Some(timeout),
        })
    }

    /// Build from configuration: capacity 0 means unbounded.
    pub fn from_config(config: &QueueConfig) -> Result<Self> {
        if config.capacity == 0 {
            Ok(Self::unbounded())
        } else {
            Self::bounded(config.capacity, config.timeout())
        }
    }

    /// Whether this queue has a capacity limit.
    pub fn is_bounded(&self) -> bool {
        self.timeout.is_some()
    }

    /// Insert a result.
    ///
    /// Unbounded queues always accept. Bounded queues return `false` if no
    /// space frees up within the timeout.
    pub async fn add(&self, result: PendingResult) -> bool {
        match self.timeout {
            None => self.tx.try_send(result).is_ok(),
            Some(timeout) => matches!(
                tokio::time::timeout(timeout, self.tx.send(result)).await,
                Ok(Ok(()))
            ),
        }
    }

    /// Insert a result, treating rejection as an error.
    ///
    /// A rejected result is a lost record, so producers must surface this.
    pub async fn record(&self, result: PendingResult) -> Result<()> {
        let correlation_id = result.correlation_id.clone();
        if self.add(result).await {
            Ok(())
        } else {
            Err(LoadError::QueueOverflow {
                correlation_id,
                timeout: self.timeout.unwrap_or_default(),
            })
        }
    }

    /// Remove the oldest result.
    ///
    /// Bounded queues give up after the timeout and return `None`. Unbounded
    /// queues wait until a result arrives.
    pub async fn drain(&self) -> Option<PendingResult> {
        match self.timeout {
            None => self.rx.recv().await.ok(),
            Some(timeout) => match tokio::time::timeout(timeout, self.rx.recv()).await {
                Ok(Ok(result)) => Some(result),
                _ => None,
            },
        }
    }

    /// Remove the oldest result without waiting.
    pub fn try_drain(&self) -> Option<PendingResult> {
        self.rx.try_recv().ok()
    }

    /// Remove everything currently queued.
    pub fn drain_ready(&self) -> Vec<PendingResult> {
        std::iter::from_fn(|| self.try_drain()).collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn result(id: &str) -> PendingResult {
        PendingResult {
            correlation_id: id.to_string(),
            request_id: "req".to_string(),
            index: "idx".to_string(),
            elapsed: Duration::from_millis(3),
            items: vec![],
            failure: None,
        }
    }

    #[tokio::test]
    async fn test_unbounded_add_always_succeeds() {
        let queue = ResultQueue::unbounded();
        for i in 0..1000 {
            assert!(queue.add(result(&format!("s_{}", i))).await);
        }
        assert_eq!(queue.len(), 1000);
        assert!(!queue.is_bounded());
    }

    #[tokio::test]
    async fn test_bounded_add_times_out_when_full() {
        let queue = ResultQueue::bounded(1, Duration::from_millis(50)).unwrap();
        assert!(queue.add(result("s_0")).await);

        let start = Instant::now();
        assert!(!queue.add(result("s_1")).await);
        assert!(start.elapsed() >= Duration::from_millis(45));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_record_surfaces_overflow() {
        let queue = ResultQueue::bounded(1, Duration::from_millis(10)).unwrap();
        queue.record(result("s_0")).await.unwrap();
        let err = queue.record(result("s_1")).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::QueueOverflow { ref correlation_id, .. } if correlation_id == "s_1"
        ));
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = ResultQueue::unbounded();
        queue.add(result("a")).await;
        queue.add(result("b")).await;
        assert_eq!(queue.drain().await.unwrap().correlation_id, "a");
        assert_eq!(queue.drain().await.unwrap().correlation_id, "b");
    }

    #[tokio::test]
    async fn test_bounded_drain_returns_none_after_timeout() {
        let queue = ResultQueue::bounded(4, Duration::from_millis(20)).unwrap();
        assert!(queue.drain().await.is_none());
    }

    #[tokio::test]
    async fn test_unbounded_drain_waits_for_producer() {
        let queue = ResultQueue::unbounded();
        let producer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.add(result("late")).await;
        });
        assert_eq!(queue.drain().await.unwrap().correlation_id, "late");
    }

    #[tokio::test]
    async fn test_drain_frees_space_for_waiting_add() {
        let queue = ResultQueue::bounded(1, Duration::from_millis(500)).unwrap();
        queue.add(result("first")).await;
        let consumer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            consumer.try_drain();
        });
        assert!(queue.add(result("second")).await);
    }

    #[test]
    fn test_bounded_rejects_invalid_settings() {
        assert!(ResultQueue::bounded(0, Duration::from_millis(10)).is_err());
        assert!(ResultQueue::bounded(1, Duration::ZERO).is_err());
    }

    #[test]
    fn test_from_config_zero_capacity_is_unbounded() {
        let queue = ResultQueue::from_config(&QueueConfig::default()).unwrap();
        assert!(!queue.is_bounded());
    }

    #[test]
    fn test_failure_detection() {
        let mut r = result("s_0");
        assert!(r.is_success());
        r.items.push(ItemOutcome {
            id: Some("x".into()),
            action: "index".into(),
            status: 400,
            error: Some(ItemError {
                kind: "mapper_parsing_exception".into(),
                reason: "bad".into(),
            }),
        });
        assert!(r.has_failures());
        assert_eq!(r.failed_items().count(), 1);
    }
}
