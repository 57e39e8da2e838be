//! One JSON file per dispatched batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::BackupConfig;
use crate::core::{BackupStore, ReshapedBatch, StoreResult};
use crate::error::Result;

/// Writes each batch to `{dir}/{identifier}.json` as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    timeout: Option<Duration>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: None,
        }
    }

    /// Give up on writes that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &BackupConfig) -> Self {
        let store = Self::new(config.dir.clone());
        match config.timeout_ms {
            Some(ms) => store.with_timeout(Duration::from_millis(ms)),
            None => store,
        }
    }

    /// File a batch with this identifier is written to.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(identifier)))
    }

    async fn write(&self, path: &Path, batch: &ReshapedBatch) -> Result<()> {
        let json = serde_json::to_vec_pretty(&batch.documents)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Identifiers embed reader paths; keep the file inside the backup directory.
fn sanitize(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

#[async_trait]
impl BackupStore for JsonFileStore {
    async fn store(&self, identifier: &str, batch: Arc<ReshapedBatch>) -> StoreResult {
        let path = self.path_for(identifier);
        let write = self.write(&path, &batch);
        let outcome = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, write).await {
                Ok(result) => result,
                Err(_) => {
                    return StoreResult::failure(format!(
                        "writing {} timed out after {:?}",
                        path.display(),
                        timeout
                    ))
                }
            },
            None => write.await,
        };

        match outcome {
            Ok(()) => {
                debug!("Backed up {} documents to {}", batch.len(), path.display());
                StoreResult::success()
            }
            Err(e) => StoreResult::failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Properties, Value};

    fn batch() -> Arc<ReshapedBatch> {
        let mut doc = Properties::new();
        doc.insert("n".into(), Value::Int(1));
        Arc::new(ReshapedBatch {
            documents: vec![doc],
            index_type: None,
        })
    }

    #[tokio::test]
    async fn test_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let result = store.store("source_0", batch()).await;
        assert_eq!(result, StoreResult::success());

        let written = std::fs::read_to_string(dir.path().join("source_0.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, serde_json::json!([{"n": 1}]));
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("backup");
        let store = JsonFileStore::new(&nested);
        assert!(store.store("s_1", batch()).await.stored);
        assert!(nested.join("s_1.json").exists());
    }

    #[tokio::test]
    async fn test_unwritable_location_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let store = JsonFileStore::new(blocker.join("sub"));
        let result = store.store("s_0", batch()).await;
        assert!(!result.stored);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_identifier_with_path_stays_in_dir() {
        let store = JsonFileStore::new("/backup");
        assert_eq!(
            store.path_for("data/a.json_3"),
            PathBuf::from("/backup/data_a.json_3.json")
        );
    }
}
