//! # index-loader
//!
//! Typed, paginated bulk loading of documents into a search index.
//!
//! Documents are read a page at a time from a source, checked and coerced
//! against a declared field mapping, and dispatched as bulk requests without
//! waiting for them to complete. Outcomes come back through a
//! backpressure-aware result queue.
//!
//! - **Semantic types** with strict coercion rules (booleans, fixed-width
//!   numbers, text, dates, IP addresses, completion suggestions)
//! - **Pre-flight validation** reporting every schema violation at once
//! - **Bounded memory**: one page of raw documents at a time
//! - **Asynchronous dispatch** with optional fire-and-forget backups
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use index_loader::{
//!     BulkLoader, Config, ElasticSink, JsonDirectorySource, Reshaper, ResultQueue,
//!     SchemaSet, TypeRegistry,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> index_loader::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let registry = Arc::new(TypeRegistry::new(&config.parser)?);
//!     let queue = ResultQueue::from_config(&config.queue)?;
//!     let sink = Arc::new(ElasticSink::new(&config.target, queue.clone())?);
//!     let reshaper = Reshaper::new(registry).with_index_type(config.target.index_type.clone());
//!     let schema = SchemaSet::new(config.field_mappings());
//!
//!     let loader = BulkLoader::new(config.bulk.clone(), schema, reshaper, sink)?;
//!     let mut source = JsonDirectorySource::open(&config.source.dir)?;
//!     let outcome = loader.load(&mut source, &CancellationToken::new()).await?;
//!     let completion = outcome.await_completion(config.bulk.completion_timeout()).await?;
//!     println!("{} bulk requests acknowledged", completion.acknowledged);
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod config;
pub mod core;
pub mod datatype;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod reshape;
pub mod schema;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use crate::backup::JsonFileStore;
pub use crate::config::{
    BackupConfig, BulkConfig, Config, MappingConfig, ParserSettings, QueueConfig, SourceConfig,
    TargetConfig,
};
pub use crate::core::{
    BackupStore, BulkSink, DataSource, DispatchHandle, Document, DocumentReader, PagingCriteria,
    Properties, ReshapedBatch, StoreResult, Value,
};
pub use crate::datatype::{DataType, SemanticType, TypeError, TypeRegistry};
pub use crate::error::{LoadError, PipelinePhase, Result};
pub use crate::orchestrator::{BulkLoader, CompletionSummary, LoadOutcome, LoadSummary};
pub use crate::queue::{ItemError, ItemOutcome, PendingResult, ResultQueue};
pub use crate::reshape::Reshaper;
pub use crate::schema::{FieldMapping, SchemaSet, SchemaValidator, SchemaViolation, Violation};
pub use crate::source::{JsonDirectorySource, JsonFileReader};
pub use crate::target::ElasticSink;
