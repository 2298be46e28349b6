//! CLI definitions for tweetstats.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::{LogFormat, LogLevel};

/// tweetstats - Hashtag statistics for tweet collections
#[derive(Parser, Debug)]
#[command(name = "tweetstats")]
#[command(version)]
#[command(about = "Validate, flatten and summarize tweets carrying a hashtag")]
#[command(long_about = r#"
tweetstats reads a JSON array of raw tweets (or fetches them from the
search API), keeps well-formed tweets tagged with the target hashtag and
writes two CSV tables:

  general_analysis_results.csv        most active day and activity totals
  user_specific_analysis_results.csv  one row per user

Quick start:
  1. Put a tweet dump at data/raw/tweets.json
  2. Run: tweetstats
  3. Read the tables in data/processed/

Fetching needs TWITTER_BEARER_TOKEN in the environment or in a .env file.
"#)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/tweetstats/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the CSV tables are written to
    #[arg(long, short = 'o', env = "TWEETSTATS_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Hashtag to track, with or without '#'
    #[arg(long, short = 't', env = "TWEETSTATS_TARGET", global = true)]
    pub target: Option<String>,

    /// Summary format printed after a run
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level: error, warn, info, debug, trace or off
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log format: compact, pretty or full
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze tweets from a local JSON file (the default)
    Analyze(AnalyzeArgs),

    /// Fetch recent tweets from the search API, save them, then analyze
    Fetch(FetchArgs),

    /// Show or manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// JSON array of raw tweets (default: data/raw/tweets.json)
    #[arg(long, short = 'i', env = "TWEETSTATS_INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// How many days back to search
    #[arg(long, short = 'd')]
    pub days: Option<u64>,

    /// Where fetched tweets are saved (default: data/raw/tweets_api.json)
    #[arg(long)]
    pub save_to: Option<PathBuf>,

    /// Attempts per page before giving up on timeouts
    #[arg(long)]
    pub max_retries: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Write a default config file if none exists
    #[arg(long)]
    pub init: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    /// Parses the names used in config files and `TWEETSTATS_FORMAT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}
