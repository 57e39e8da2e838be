//! index-loader CLI - Typed bulk loading of JSON documents into a search index.

use clap::{Parser, Subcommand};
use index_loader::{
    BulkLoader, CompletionSummary, Config, DataSource, DocumentReader, ElasticSink,
    JsonDirectorySource, JsonFileStore, LoadError, LoadSummary, PagingCriteria, PendingResult,
    PipelinePhase, Reshaper, ResultQueue, SchemaSet, SchemaValidator, TypeRegistry,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "index-loader")]
#[command(about = "Typed, paginated bulk loading of JSON documents into a search index")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Timeout in seconds for graceful shutdown (default: 60)
    #[arg(long, default_value = "60")]
    shutdown_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every source file into the index
    Load {
        /// Override documents per page and per bulk request
        #[arg(long)]
        max_elements: Option<i64>,

        /// Override target index
        #[arg(long)]
        index: Option<String>,

        /// Skip the backup configured in the file
        #[arg(long)]
        no_backup: bool,
    },

    /// Check every source document against the mappings without loading
    Validate {
        /// Override documents per page
        #[arg(long)]
        max_elements: Option<i64>,

        /// Require values to already have their declared type instead of
        /// checking that they can be coerced to it
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), LoadError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(LoadError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Load {
            max_elements,
            index,
            no_backup,
        } => {
            if let Some(n) = max_elements {
                config.bulk.max_elements_per_bulk = n;
            }
            if let Some(name) = index {
                config.target.index = name;
            }
            if no_backup {
                config.backup = None;
            }
            config.validate()?;

            let cancel_token = setup_signal_handler(cli.shutdown_timeout).await?;
            load(
                config,
                cancel_token,
                Duration::from_secs(cli.shutdown_timeout),
                cli.output_json,
            )
            .await
        }

        Commands::Validate {
            max_elements,
            strict,
        } => {
            if let Some(n) = max_elements {
                config.bulk.max_elements_per_bulk = n;
            }
            config.validate()?;
            validate(&config, strict, cli.output_json).await
        }
    }
}

async fn load(
    config: Config,
    cancel_token: CancellationToken,
    shutdown_timeout: Duration,
    output_json: bool,
) -> Result<(), LoadError> {
    let registry = Arc::new(TypeRegistry::new(&config.parser)?);
    let queue = ResultQueue::from_config(&config.queue)?;
    let sink = Arc::new(ElasticSink::new(&config.target, queue.clone())?);
    let reshaper = Reshaper::new(registry).with_index_type(config.target.index_type.clone());

    let mut loader = BulkLoader::new(
        config.bulk.clone(),
        SchemaSet::new(config.field_mappings()),
        reshaper,
        sink,
    )?;
    if let Some(backup) = &config.backup {
        info!("Backing up batches to {}", backup.dir.display());
        loader = loader.with_backup(Arc::new(JsonFileStore::from_config(backup)));
    }

    let consumer_done = CancellationToken::new();
    let consumer = spawn_result_consumer(queue, consumer_done.clone());

    let mut source = JsonDirectorySource::open(&config.source.dir)?;
    let outcome = loader.load(&mut source, &cancel_token).await?;
    let cancelled = outcome.summary.cancelled;

    // In-flight requests still get their outcomes recorded after a signal.
    let wait = if cancelled {
        shutdown_timeout
    } else {
        config.bulk.completion_timeout()
    };
    let summary = outcome.summary.clone();
    let completion = outcome.await_completion(wait).await?;

    consumer_done.cancel();
    let stats = consumer
        .await
        .map_err(|e| LoadError::Sink(format!("result consumer failed: {}", e)))?;

    if output_json {
        let report = json!({
            "summary": summary,
            "completion": completion,
            "documents_indexed": stats.documents_indexed,
            "documents_rejected": stats.documents_rejected,
            "backup_failures": loader.backup_failures(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_load_summary(&summary, &completion, &stats, loader.backup_failures());
    }

    if cancelled {
        return Err(LoadError::Cancelled);
    }
    if !completion.is_clean() {
        return Err(LoadError::Sink(format!(
            "{} bulk requests had rejected documents, {} failed",
            completion.rejected, completion.failed
        )));
    }
    Ok(())
}

fn print_load_summary(
    summary: &LoadSummary,
    completion: &CompletionSummary,
    stats: &ResultStats,
    backup_failures: u64,
) {
    let status = if summary.cancelled {
        "Load cancelled!"
    } else {
        "Load completed!"
    };
    println!("\n{}", status);
    println!("  Run ID: {}", summary.run_id);
    println!("  Duration: {:.2}s", summary.duration_seconds);
    println!("  Files: {}", summary.readers);
    println!(
        "  Documents: {} read, {} dispatched",
        summary.documents_read, summary.documents_dispatched
    );
    println!(
        "  Bulk requests: {} ({} acknowledged, {} with rejections, {} failed)",
        summary.batches_dispatched, completion.acknowledged, completion.rejected, completion.failed
    );
    println!(
        "  Indexed: {} ({} rejected)",
        stats.documents_indexed, stats.documents_rejected
    );
    println!("  Throughput: {} docs/sec", summary.documents_per_second());
    if backup_failures > 0 {
        println!("  Failed backups: {}", backup_failures);
    }
}

/// Counts drained from the result queue.
#[derive(Debug, Default)]
struct ResultStats {
    documents_indexed: u64,
    documents_rejected: u64,
}

impl ResultStats {
    fn record(&mut self, result: &PendingResult) {
        if let Some(failure) = &result.failure {
            warn!("Bulk {} failed: {}", result.correlation_id, failure);
            return;
        }
        for item in result.failed_items() {
            if let Some(error) = &item.error {
                warn!(
                    "Bulk {}: document {} rejected ({}): {}",
                    result.correlation_id,
                    item.id.as_deref().unwrap_or("-"),
                    error.kind,
                    error.reason
                );
            }
        }
        let rejected = result.failed_items().count() as u64;
        self.documents_rejected += rejected;
        self.documents_indexed += result.items.len() as u64 - rejected;
        debug!(
            "Bulk {} completed in {:?}",
            result.correlation_id, result.elapsed
        );
    }
}

/// Drain the result queue until `done` fires, then take what is left.
fn spawn_result_consumer(queue: ResultQueue, done: CancellationToken) -> JoinHandle<ResultStats> {
    tokio::spawn(async move {
        let mut stats = ResultStats::default();
        loop {
            tokio::select! {
                _ = done.cancelled() => break,
                next = queue.drain() => {
                    if let Some(result) = next {
                        stats.record(&result);
                    }
                }
            }
        }
        for result in queue.drain_ready() {
            stats.record(&result);
        }
        stats
    })
}

async fn validate(config: &Config, strict: bool, output_json: bool) -> Result<(), LoadError> {
    let registry = Arc::new(TypeRegistry::new(&config.parser)?);
    let schema = SchemaSet::new(config.field_mappings());
    let validator = SchemaValidator::new(Arc::clone(&registry));
    let reshaper = Reshaper::new(registry);

    let mut source = JsonDirectorySource::open(&config.source.dir)?;
    let mut checked = 0u64;
    let mut errors = Vec::new();

    while source.has_next() {
        let mut reader = source.next_reader().await?;
        let mut criteria = PagingCriteria::from_beginning(config.bulk.max_elements_per_bulk)?;
        loop {
            let documents = reader.read(&criteria).await.map_err(|e| {
                LoadError::pipeline(reader.source_id(), criteria.page(), PipelinePhase::Read, e)
            })?;
            if documents.is_empty() {
                break;
            }
            for document in &documents {
                checked += 1;
                let outcome = if strict {
                    validator
                        .validate(document, &schema)
                        .map_err(LoadError::from)
                } else {
                    reshaper.reshape_document(document, &schema).map(|_| ())
                };
                if let Err(e) = outcome {
                    errors.push((document.id.clone(), e.to_string()));
                }
            }
            criteria = criteria.next_page();
        }
    }

    if output_json {
        let errors: Vec<_> = errors
            .iter()
            .map(|(id, error)| json!({ "document": id, "error": error }))
            .collect();
        let report = json!({
            "checked": checked,
            "invalid": errors.len(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (id, error) in &errors {
            println!("  ✗ {}: {}", id, error);
        }
        println!(
            "\nValidated {} documents: {} invalid",
            checked,
            errors.len()
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Validation {
            invalid: errors.len() as u64,
            checked,
        })
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json keeps stdout parseable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        "json" => subscriber.json().try_init(),
        "text" => subscriber.try_init(),
        other => return Err(format!("unknown log format '{}' (expected text or json)", other)),
    };
    installed.map_err(|e| e.to_string())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
async fn setup_signal_handler(shutdown_timeout: u64) -> Result<CancellationToken, LoadError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!(
            "\nReceived {}. Shutting down gracefully (timeout: {}s)...",
            name, shutdown_timeout
        );
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler(_shutdown_timeout: u64) -> Result<CancellationToken, LoadError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
