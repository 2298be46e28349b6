//! tweetstats - Hashtag statistics for tweet collections
//!
//! This library validates raw tweets, flattens the ones carrying a target
//! hashtag and summarizes them into a general table and a per-user table.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Layered configuration (defaults, file, environment)
//! - [`error`] - Custom error types with rich context
//! - [`model`] - Records and result tables
//! - [`validate`] - Schema checks on raw tweets
//! - [`transform`] - Flattening and hashtag filtering
//! - [`analysis`] - General and per-user statistics
//! - [`pipeline`] - Validate, transform and analyze in one call
//! - [`fetch`] - Search API client with retries and pagination
//! - [`storage`] - JSON input and CSV output
//! - [`logging`] - Tracing setup and pipeline event reporting

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod transform;
pub mod validate;

pub use analysis::{AnalysisOptions, analyze};
pub use cli::*;
pub use config::Config;
pub use error::{FetchError, Result, SchemaViolation, StatsError, format_error};
pub use fetch::{Fetcher, HttpSearchClient, RetryPolicy, SearchClient, SearchQuery};
pub use logging::{MemoryReporter, PipelineEvent, Reporter, TracingReporter};
pub use model::*;
pub use pipeline::Pipeline;
pub use storage::{OutputPaths, load_records, save_records, write_report};

/// Standard width for header dividers in CLI output
pub const HEADER_DIVIDER_WIDTH: usize = 50;

/// Format an unsigned integer with thousands separators.
#[must_use]
pub fn format_number_u64(value: u64) -> String {
    let mut out = String::with_capacity(24);

    for (idx, ch) in value.to_string().chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}

/// Format a usize with thousands separators.
#[must_use]
pub fn format_number_usize(value: usize) -> String {
    format_number_u64(u64::try_from(value).unwrap_or(u64::MAX))
}

/// Shorten `text` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}
