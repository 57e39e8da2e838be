//! JSON array files as paginated readers.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, SeqAccess, Visitor};
use tracing::{debug, info};

use crate::core::{DataSource, Document, DocumentReader, PagingCriteria, Properties, Value};
use crate::error::{LoadError, Result};

/// One reader per `*.json` file in a directory, in file name order.
#[derive(Debug)]
pub struct JsonDirectorySource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl JsonDirectorySource {
    /// List the JSON files in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_json = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if is_json && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        info!("Found {} JSON files in {}", files.len(), dir.display());

        Ok(Self {
            dir,
            pending: files.into(),
        })
    }

    /// Directory being read.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl DataSource for JsonDirectorySource {
    fn has_next(&self) -> bool {
        !self.pending.is_empty()
    }

    async fn next_reader(&mut self) -> Result<Box<dyn DocumentReader>> {
        let path = self.pending.pop_front().ok_or_else(|| {
            LoadError::Config(format!("no more JSON files in {}", self.dir.display()))
        })?;
        Ok(Box::new(JsonFileReader::new(path)))
    }
}

/// Paginated reader over one JSON array file.
///
/// Every page re-streams the file, skipping earlier elements without
/// materializing them, so memory stays bounded by the page size.
#[derive(Debug, Clone)]
pub struct JsonFileReader {
    path: PathBuf,
    source_id: String,
}

impl JsonFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source_id = path.display().to_string();
        Self { path, source_id }
    }
}

#[async_trait]
impl DocumentReader for JsonFileReader {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn read(&mut self, criteria: &PagingCriteria) -> Result<Vec<Document>> {
        let path = self.path.clone();
        let skip = usize::try_from(criteria.start_at()).unwrap_or(usize::MAX);
        let take = usize::try_from(criteria.size()).unwrap_or(usize::MAX);

        let values = tokio::task::spawn_blocking(move || read_window(&path, skip, take))
            .await
            .map_err(|e| LoadError::Io(std::io::Error::other(e.to_string())))??;
        debug!(
            "Read {} elements from {} (page {})",
            values.len(),
            self.source_id,
            criteria.page()
        );

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                serde_json::Value::Object(obj) => {
                    let properties: Properties =
                        obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                    Ok(Document::new(
                        format!("{}#{}", self.source_id, skip + i),
                        properties,
                    ))
                }
                other => Err(LoadError::Json(serde::de::Error::custom(format!(
                    "element {} of {} is not an object: {}",
                    skip + i,
                    self.source_id,
                    other
                )))),
            })
            .collect()
    }
}

fn read_window(path: &Path, skip: usize, take: usize) -> Result<Vec<serde_json::Value>> {
    let reader = BufReader::new(File::open(path)?);
    let mut de = serde_json::Deserializer::from_reader(reader);
    let values = Window { skip, take }.deserialize(&mut de)?;
    de.end()?;
    Ok(values)
}

/// Selects `take` elements after the first `skip` of a JSON array.
struct Window {
    skip: usize,
    take: usize,
}

impl<'de> DeserializeSeed<'de> for Window {
    type Value = Vec<serde_json::Value>;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for Window {
    type Value = Vec<serde_json::Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of documents")
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        for _ in 0..self.skip {
            if seq.next_element::<IgnoredAny>()?.is_none() {
                return Ok(Vec::new());
            }
        }

        let mut out = Vec::new();
        while out.len() < self.take {
            match seq.next_element::<serde_json::Value>()? {
                Some(value) => out.push(value),
                None => return Ok(out),
            }
        }

        // the array must still be consumed to its closing bracket
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(out)
    }
}
