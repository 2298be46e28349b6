//! Logging for tweetstats.
//!
//! Two layers live here:
//!
//! - Process-level `tracing` setup ([`init_logging`], [`LogConfig`]) used by
//!   the binary.
//! - The [`Reporter`] trait the pipeline announces its outcomes through.
//!   Library code never talks to a global logger directly; it is handed a
//!   reporter. [`TracingReporter`] forwards to `tracing`, [`MemoryReporter`]
//!   records events so tests can assert on them.
//!
//! # Usage
//!
//! ```rust
//! use tweetstats::logging::{init_logging, LogConfig, TracingReporter};
//!
//! init_logging(&LogConfig::default());
//! let reporter = TracingReporter;
//! # let _ = reporter;
//! ```

use std::cell::RefCell;
use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::SchemaViolation;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display.
    pub level: LogLevel,
    /// Output format for log messages.
    pub format: LogFormat,
    /// Include timestamps in log output.
    pub timestamps: bool,
    /// Include target (module path) in log output.
    pub target: bool,
    /// Enable ANSI colors in output.
    pub colors: bool,
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    /// No logging at all.
    Off,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    Compact,
    /// Full format with file and line numbers.
    Full,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            colors: true,
        }
    }
}

impl LogConfig {
    /// Errors only.
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            colors: true,
        }
    }

    /// Debug level with timestamps and module paths.
    #[must_use]
    pub const fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            timestamps: true,
            target: true,
            colors: true,
        }
    }

    /// Preset picked by `--quiet`/`--verbose`, with explicit level and
    /// format choices applied on top.
    #[must_use]
    pub fn for_cli(
        quiet: bool,
        verbose: bool,
        level: Option<LogLevel>,
        format: Option<LogFormat>,
    ) -> Self {
        let mut config = if quiet {
            Self::quiet()
        } else if verbose {
            Self::verbose()
        } else {
            Self::default()
        };
        if let Some(level) = level {
            config.level = level;
        }
        if let Some(format) = format {
            config.format = format;
        }
        config
    }

    /// Disable ANSI colors (e.g. when `NO_COLOR` is set).
    #[must_use]
    pub const fn without_colors(mut self) -> Self {
        self.colors = false;
        self
    }
}

impl LogLevel {
    /// Convert to env filter directive string.
    const fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Off => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warn" | "warning" | "w" => Ok(Self::Warn),
            "info" | "i" => Ok(Self::Info),
            "debug" | "d" => Ok(Self::Debug),
            "trace" | "t" => Ok(Self::Trace),
            "off" | "none" | "quiet" => Ok(Self::Off),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(Self::Pretty),
            "compact" | "c" => Ok(Self::Compact),
            "full" | "f" => Ok(Self::Full),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}

/// Initialize the global subscriber. Later calls are ignored.
///
/// `RUST_LOG`, when set, wins over `config.level`.
pub fn init_logging(config: &LogConfig) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("tweetstats={}", config.level.to_filter_string()))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_ansi(config.colors)
                .with_target(config.target);
            if config.timestamps {
                registry.with(layer).try_init().ok();
            } else {
                registry.with(layer.without_time()).try_init().ok();
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_ansi(config.colors)
                .with_target(config.target);
            if config.timestamps {
                registry.with(layer).try_init().ok();
            } else {
                registry.with(layer.without_time()).try_init().ok();
            }
        }
        LogFormat::Full => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.colors)
                .with_target(config.target)
                .with_file(true)
                .with_line_number(true);
            registry.with(layer).try_init().ok();
        }
    }
}

/// Run `f` under a plain stderr subscriber showing warnings and errors.
///
/// For work done before [`init_logging`] can be called, such as loading the
/// config that decides on colors.
pub fn with_bootstrap_logging<T>(quiet: bool, f: impl FnOnce() -> T) -> T {
    let level = if quiet { LogLevel::Error } else { LogLevel::Warn };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(format!(
            "tweetstats={}",
            level.to_filter_string()
        )))
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Logs the start and end of a pipeline stage with its duration.
pub struct OperationGuard {
    name: String,
    start: std::time::Instant,
}

impl OperationGuard {
    /// Start tracking an operation.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::debug!(operation = %name, "Starting operation");
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }

    /// Complete the operation successfully.
    pub fn complete(self) {
        tracing::debug!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            "Operation completed"
        );
    }

    /// Mark the operation as failed.
    pub fn fail(self, error: &dyn std::error::Error) {
        tracing::error!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            error = %error,
            "Operation failed"
        );
    }
}

// ============================================================================
// Pipeline reporting
// ============================================================================

/// Something the pipeline wants the outside world to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Preprocessing began on `total` raw records.
    Started { total: usize },
    /// The record at `index` was excluded by the schema validator.
    Rejected {
        index: usize,
        violation: SchemaViolation,
    },
    /// Not a single record passed validation.
    NoValidRecords { total: usize },
    /// Preprocessing finished.
    Transformed {
        valid: usize,
        rejected: usize,
        retained: usize,
    },
    /// Statistics computed.
    Analyzed { records: usize, users: usize },
    /// One page of search results arrived.
    FetchedPage { page: usize, records: usize },
    /// A transient fetch failure is about to be retried.
    FetchRetry {
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    /// The fetch was abandoned.
    FetchFailed { error: String },
    /// A file was written.
    Saved { path: PathBuf, rows: usize },
}

/// Sink for [`PipelineEvent`]s.
pub trait Reporter {
    fn report(&self, event: &PipelineEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started { total } => {
                tracing::info!(total, "Starting data preprocessing for {total} tweets");
            }
            PipelineEvent::Rejected { index, violation } => {
                tracing::debug!(index, %violation, "Skipping tweet with schema mismatch");
            }
            PipelineEvent::NoValidRecords { total } => {
                tracing::error!(total, "No valid tweets found due to schema mismatch");
            }
            PipelineEvent::Transformed {
                valid,
                rejected,
                retained,
            } => {
                if *rejected > 0 {
                    tracing::warn!(rejected, "Excluded {rejected} tweets with schema mismatch");
                }
                tracing::info!(
                    valid,
                    retained,
                    "Preprocessing completed. {valid} tweets are valid for analysis"
                );
            }
            PipelineEvent::Analyzed { records, users } => {
                tracing::info!(records, users, "Analysis completed");
            }
            PipelineEvent::FetchedPage { page, records } => {
                tracing::debug!(page, records, "Fetched search page");
            }
            PipelineEvent::FetchRetry {
                attempt,
                max_attempts,
                error,
            } => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    %error,
                    "Timeout while fetching tweets. Retrying..."
                );
            }
            PipelineEvent::FetchFailed { error } => {
                tracing::error!(%error, "Failed to fetch tweets");
            }
            PipelineEvent::Saved { path, rows } => {
                tracing::info!(path = %path.display(), rows, "Saved results");
            }
        }
    }
}

/// Collects events in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: RefCell<Vec<PipelineEvent>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.borrow().clone()
    }

    /// Number of `Rejected` events seen.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Rejected { .. }))
            .count()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &PipelineEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
