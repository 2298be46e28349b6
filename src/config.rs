//! Configuration system for tweetstats.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Sensible defaults built into the binary
//! 2. **Config file** - `~/.config/tweetstats/config.toml` (or `--config`)
//! 3. **Environment variables** - `TWEETSTATS_*` prefix
//! 4. **CLI arguments** - Highest priority, always wins
//!
//! API credentials are never read from the config file; see
//! [`crate::fetch::BEARER_TOKEN_VAR`].
//!
//! # Example Configuration File
//!
//! ```toml
//! [paths]
//! input = "data/raw/tweets.json"
//! fetched = "data/raw/tweets_api.json"
//! output_dir = "data/processed"
//!
//! [analysis]
//! target_hashtag = "flixbus"
//! min_hashtags = 3
//! top_n = 5
//!
//! [fetch]
//! days = 7
//! max_retries = 3
//! retry_delay_secs = 5
//! timeout_secs = 10
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisOptions, MIN_HASHTAGS, TOP_HASHTAGS};
use crate::error::{Result, StatsError};
use crate::fetch::{DEFAULT_API_BASE, RetryPolicy};
use crate::pipeline::{DEFAULT_TARGET_HASHTAG, Pipeline};

/// Default location of the tweet file analyzed when not fetching.
pub const DEFAULT_INPUT_PATH: &str = "data/raw/tweets.json";

/// Default location fetched tweets are saved to.
pub const DEFAULT_FETCHED_PATH: &str = "data/raw/tweets_api.json";

/// Default directory for the CSV result tables.
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// Main configuration structure for tweetstats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// File locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Tweet file analyzed in load mode.
    /// Environment variable: `TWEETSTATS_INPUT`
    pub input: Option<PathBuf>,

    /// Where fetched tweets are written before analysis.
    pub fetched: Option<PathBuf>,

    /// Directory for the result tables.
    /// Environment variable: `TWEETSTATS_OUTPUT_DIR`
    pub output_dir: Option<PathBuf>,
}

/// What to analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Hashtag tweets must carry (case-insensitive, without `#`).
    /// Environment variable: `TWEETSTATS_TARGET`
    pub target_hashtag: String,

    /// Hashtag count for the "tweets with many hashtags" figure.
    pub min_hashtags: usize,

    /// Hashtags listed per user.
    pub top_n: usize,
}

/// Search API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub api_base: String,

    /// How many days back to search.
    /// Environment variable: `TWEETSTATS_DAYS`
    pub days: u64,

    /// Attempts per page before giving up on timeouts.
    /// Environment variable: `TWEETSTATS_MAX_RETRIES`
    pub max_retries: u32,

    /// Pause between attempts.
    /// Environment variable: `TWEETSTATS_RETRY_DELAY_SECS`
    pub retry_delay_secs: u64,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Tweets per page (API maximum is 100).
    pub page_size: u32,

    /// Upper bound on pages followed.
    pub max_pages: usize,

    /// Language filter; empty for all languages.
    pub lang: String,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Summary format: text, json, json-pretty.
    /// Environment variable: `TWEETSTATS_FORMAT`
    pub format: String,

    /// Enable colored output (`NO_COLOR` disables).
    pub colors: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_hashtag: DEFAULT_TARGET_HASHTAG.to_string(),
            min_hashtags: MIN_HASHTAGS,
            top_n: TOP_HASHTAGS,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            days: 7,
            max_retries: 3,
            retry_delay_secs: 5,
            timeout_secs: 10,
            page_size: 100,
            max_pages: 50,
            lang: "en".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. `explicit` config file, else the user config file
    /// 3. Compiled defaults
    ///
    /// # Errors
    ///
    /// Fails if `explicit` is given but cannot be read or parsed, or if an
    /// environment override does not parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match explicit {
            Some(path) => config.merge(Self::read_file(path)?),
            None => {
                if let Some(user_config) = Self::load_user_config() {
                    config.merge(user_config);
                }
            }
        }

        config.apply_env_overrides(|var| std::env::var(var).ok())?;

        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Read and parse one config file.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::ConfigError`] if the file is unreadable or not
    /// valid TOML for this schema.
    pub fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StatsError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = toml::from_str(&content).map_err(|e| StatsError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// The user config file, if present and valid. Problems are logged.
    fn load_user_config() -> Option<Self> {
        let path = Self::user_config_path()?;
        if !path.exists() {
            debug!("Config file not found: {}", path.display());
            return None;
        }
        Self::read_file(&path)
            .inspect_err(|e| warn!("Ignoring config file: {e}"))
            .ok()
    }

    /// Get the path to the user configuration file.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tweetstats").join("config.toml"))
    }

    /// Apply `TWEETSTATS_*` overrides looked up through `var`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EnvVarError`] for numeric variables that do not
    /// parse.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = var("TWEETSTATS_INPUT") {
            self.paths.input = Some(PathBuf::from(input));
        }
        if let Some(dir) = var("TWEETSTATS_OUTPUT_DIR") {
            self.paths.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(target) = var("TWEETSTATS_TARGET") {
            self.analysis.target_hashtag = target;
        }
        if let Some(days) = var("TWEETSTATS_DAYS") {
            self.fetch.days = parse_env("TWEETSTATS_DAYS", &days)?;
        }
        if let Some(retries) = var("TWEETSTATS_MAX_RETRIES") {
            self.fetch.max_retries = parse_env("TWEETSTATS_MAX_RETRIES", &retries)?;
        }
        if let Some(delay) = var("TWEETSTATS_RETRY_DELAY_SECS") {
            self.fetch.retry_delay_secs = parse_env("TWEETSTATS_RETRY_DELAY_SECS", &delay)?;
        }
        if let Some(format) = var("TWEETSTATS_FORMAT") {
            self.output.format = format;
        }
        if var("TWEETSTATS_NO_COLOR").is_some() || var("NO_COLOR").is_some() {
            self.output.colors = false;
        }
        Ok(())
    }

    /// Merge another config into this one (other takes precedence).
    fn merge(&mut self, other: Self) {
        if other.paths.input.is_some() {
            self.paths.input = other.paths.input;
        }
        if other.paths.fetched.is_some() {
            self.paths.fetched = other.paths.fetched;
        }
        if other.paths.output_dir.is_some() {
            self.paths.output_dir = other.paths.output_dir;
        }

        self.analysis = other.analysis;
        self.fetch = other.fetch;
        self.output = other.output;
    }

    #[must_use]
    pub fn input_path(&self) -> PathBuf {
        self.paths
            .input
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH))
    }

    #[must_use]
    pub fn fetched_path(&self) -> PathBuf {
        self.paths
            .fetched
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FETCHED_PATH))
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    #[must_use]
    pub const fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            min_hashtags: self.analysis.min_hashtags,
            top_n: self.analysis.top_n,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(&self.analysis.target_hashtag, self.analysis_options())
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.fetch.max_retries,
            Duration::from_secs(self.fetch.retry_delay_secs),
        )
    }

    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Write this configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StatsError::path_error("create", parent, e))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| StatsError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| StatsError::path_error("write", path, e))?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| StatsError::EnvVarError {
        var: var.to_string(),
        reason: format!("'{value}': {e}"),
    })
}
