//! Custom error types for tweetstats.
//!
//! Provides structured error handling with detailed context for better
//! diagnostics and user experience.

use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for tweetstats operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling better error messages and programmatic error handling.
#[derive(Error, Debug)]
pub enum StatsError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Input record file not found at the specified path.
    #[error("Input file not found at '{path}'")]
    InputNotFound { path: PathBuf },

    /// Input file exists but is not a JSON array of records.
    #[error("Invalid input in '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    // =========================================================================
    // Fetch Errors
    // =========================================================================
    /// Retrieving records from the search API failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    // =========================================================================
    // IO Errors
    // =========================================================================
    /// Path-specific IO error with context.
    #[error("Failed to {operation} '{path}': {source}")]
    PathError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error while writing a result table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file parsing error.
    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigError { path: PathBuf, reason: String },

    /// Environment variable error.
    #[error("Invalid environment variable {var}: {reason}")]
    EnvVarError { var: String, reason: String },
}

/// Result type alias for tweetstats operations.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Create an input not found error.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create an invalid input error.
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a path error with context.
    pub fn path_error(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::PathError {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Get a suggestion for how to fix this error, if applicable.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InputNotFound { .. } => Some(
                "Pass --input <file> or run 'tweetstats fetch' to download recent tweets first.",
            ),
            Self::InvalidInput { .. } => {
                Some("The input file must contain a JSON array of tweet objects.")
            }
            Self::ConfigError { .. } => {
                Some("Run 'tweetstats config --init' to write a fresh default config.")
            }
            Self::Fetch(err) => err.suggestion(),
            Self::PathError { .. } => {
                Some("Check that the output directory is writable or pass --output-dir.")
            }
            _ => None,
        }
    }
}

/// Errors raised while talking to the search API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request timed out; safe to retry.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Transport failure other than a timeout (DNS, TLS, connection refused).
    #[error("HTTP request failed: {reason}")]
    Http { reason: String },

    /// API answered with a non-success status.
    #[error("Search API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected search payload.
    #[error("Failed to decode search response: {reason}")]
    Decode { reason: String },

    /// Bearer token not configured.
    #[error("Missing API credentials: set {var}")]
    MissingCredentials { var: &'static str },

    /// Every attempt failed with a transient error.
    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingCredentials { .. } => Some(
                "Export TWITTER_BEARER_TOKEN or put it in a .env file in the working directory.",
            ),
            Self::RetriesExhausted { .. } | Self::Timeout { .. } => Some(
                "The API is slow to respond; raise fetch.timeout_secs or fetch.max_retries in the config.",
            ),
            Self::Status { status: 401 | 403, .. } => {
                Some("The bearer token was rejected; check that it is valid for the search endpoint.")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: err.url().map_or_else(|| "search API".to_string(), ToString::to_string),
            }
        } else if err.is_decode() {
            Self::Decode {
                reason: err.to_string(),
            }
        } else {
            Self::Http {
                reason: err.to_string(),
            }
        }
    }
}

/// Why a raw record was excluded by the schema validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// One or more required top-level keys are absent.
    #[error("missing required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },

    /// Keys are present but a nested value has the wrong shape.
    #[error("malformed record: {reason}")]
    Shape { reason: String },
}

impl SchemaViolation {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        Self::Shape {
            reason: reason.into(),
        }
    }
}

/// Format a structured CLI error with explanation and suggestions.
///
/// # Arguments
/// * `title` - Brief error title (e.g., "Fetch failed")
/// * `explanation` - What went wrong and why
/// * `suggestions` - List of actionable suggestions
#[must_use]
pub fn format_error(title: &str, explanation: &str, suggestions: &[&str]) -> String {
    use std::fmt::Write;

    let mut output = format!("{} {}", "✗".red().bold(), title.bold());

    if !explanation.is_empty() {
        let _ = write!(output, "\n\n   {explanation}");
    }

    if !suggestions.is_empty() {
        output.push_str("\n\n   ");
        if suggestions.len() == 1 {
            let _ = write!(output, "{} {}", "Hint:".cyan(), suggestions[0]);
        } else {
            let _ = write!(output, "{}:", "Try".cyan());
            for suggestion in suggestions {
                let _ = write!(output, "\n     {} {}", "•".dimmed(), suggestion);
            }
        }
    }

    output
}
