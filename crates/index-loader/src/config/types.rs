//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::datatype::SemanticType;
use crate::schema::FieldMapping;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where raw documents come from.
    pub source: SourceConfig,

    /// Search backend receiving the bulk requests.
    pub target: TargetConfig,

    /// Date parsing settings shared by every date field.
    #[serde(default)]
    pub parser: ParserSettings,

    /// Page and bulk request sizing.
    #[serde(default)]
    pub bulk: BulkConfig,

    /// Result queue sizing.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Optional local copy of every dispatched batch.
    #[serde(default)]
    pub backup: Option<BackupConfig>,

    /// Field mappings, in the order they are checked and written.
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

impl Config {
    /// Field mappings as schema entries.
    pub fn field_mappings(&self) -> Vec<FieldMapping> {
        self.mappings.iter().map(FieldMapping::from).collect()
    }
}

/// Directory of JSON array files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding `*.json` files.
    pub dir: PathBuf,
}

/// Search backend configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL of the cluster, e.g. `http://localhost:9200`.
    pub url: String,

    /// Index receiving the documents.
    pub index: String,

    /// Type documents are grouped under (legacy multi-type indexes).
    #[serde(default)]
    pub index_type: Option<String>,

    /// Basic auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TargetConfig {
    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("url", &self.url)
            .field("index", &self.index)
            .field("index_type", &self.index_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Date parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Locale tag, e.g. `en_US` (default: "en_US").
    #[serde(default = "default_locale")]
    pub locale: String,

    /// `UTC` or a fixed offset such as `+02:00` (default: "UTC").
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// chrono format pattern for date strings (default: "%Y-%m-%d %H:%M:%S").
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            time_zone: default_time_zone(),
            date_format: default_date_format(),
        }
    }
}

/// Page and bulk sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Documents per page and per bulk request (default: 500).
    #[serde(default = "default_max_elements")]
    pub max_elements_per_bulk: i64,

    /// How long to wait for in-flight bulk requests at the end of a load
    /// (default: 10).
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,
}

impl BulkConfig {
    /// Wait bound for in-flight bulk requests.
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_elements_per_bulk: default_max_elements(),
            completion_timeout_secs: default_completion_timeout_secs(),
        }
    }
}

/// Result queue sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum pending results; 0 means unbounded (default: 0).
    #[serde(default)]
    pub capacity: usize,

    /// Insert/remove timeout in milliseconds for a bounded queue (default: 10).
    #[serde(default = "default_queue_timeout_ms")]
    pub timeout_ms: u64,
}

impl QueueConfig {
    /// Timeout applied to bounded inserts and removals.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            timeout_ms: default_queue_timeout_ms(),
        }
    }
}

/// Local JSON backup of dispatched batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory receiving one file per batch.
    pub dir: PathBuf,

    /// Write timeout in milliseconds; unset means no limit.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// One field mapping as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Source field name.
    pub name: String,

    /// Output field name (default: same as `name`).
    #[serde(default)]
    pub output_name: Option<String>,

    /// Semantic type of the field.
    ///
    /// Numeric types only accept numbers of their exact width. JSON sources
    /// yield `integer` for whole numbers that fit in 32 bits, `long` for wider
    /// ones and `double` for fractions, so `byte`, `short`, `float` and small
    /// values of `long` must be written as strings in the source files.
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
}

impl From<&MappingConfig> for FieldMapping {
    fn from(m: &MappingConfig) -> Self {
        let mapping = FieldMapping::new(m.name.clone(), m.semantic_type);
        match &m.output_name {
            Some(output) => mapping.with_output_name(output.clone()),
            None => mapping,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_max_elements() -> i64 {
    crate::core::DEFAULT_MAX_ELEMENTS
}

fn default_completion_timeout_secs() -> u64 {
    10
}

fn default_queue_timeout_ms() -> u64 {
    10
}
