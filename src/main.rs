//! tweetstats - Hashtag statistics CLI
//!
//! Main entry point for the tweetstats command-line tool.

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info};

use tweetstats::analysis::{daily_counts, sparkline_from_daily};
use tweetstats::fetch::BEARER_TOKEN_VAR;
use tweetstats::logging::{LogConfig, OperationGuard, init_logging, with_bootstrap_logging};
use tweetstats::*;

fn main() -> ExitCode {
    // A missing .env file is normal.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Completions(args)) => return cmd_completions(args),
        // Must work before any config file exists.
        Some(Commands::Config(args)) if args.init => {
            let path = cli
                .config
                .clone()
                .or_else(Config::user_config_path)
                .context("Could not determine a config directory; pass --config <file>")?;
            init_config_file(&path)?;
        }
        _ => {}
    }

    let config = with_bootstrap_logging(cli.quiet, || load_config(cli))?;
    init_output(cli, &config);
    let format = resolve_format(cli, &config)?;
    let ctx = RunContext {
        config,
        format,
        quiet: cli.quiet,
    };

    match &cli.command {
        None => cmd_analyze(&ctx, &AnalyzeArgs::default()),
        Some(Commands::Analyze(args)) => cmd_analyze(&ctx, args),
        Some(Commands::Fetch(args)) => cmd_fetch(&ctx, args),
        Some(Commands::Config(args)) => cmd_config(cli, &ctx, args),
        Some(Commands::Completions(_)) => Ok(()),
    }
}

struct RunContext {
    config: Config,
    format: OutputFormat,
    quiet: bool,
}

/// Config file and environment, then CLI flags on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.paths.output_dir = Some(dir.clone());
    }
    if let Some(target) = &cli.target {
        config.analysis.target_hashtag.clone_from(target);
    }
    Ok(config)
}

/// Colors and log output follow the loaded config.
fn init_output(cli: &Cli, config: &Config) {
    let log = LogConfig::for_cli(cli.quiet, cli.verbose, cli.log_level, cli.log_format);
    if config.output.colors {
        init_logging(&log);
    } else {
        colored::control::set_override(false);
        init_logging(&log.without_colors());
    }
}

fn resolve_format(cli: &Cli, config: &Config) -> Result<OutputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    config
        .output
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid output format in config: {e}"))
}

fn cmd_analyze(ctx: &RunContext, args: &AnalyzeArgs) -> Result<()> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| ctx.config.input_path());

    let records = load_records(&input)?;
    info!("Loaded {} tweets from {}", records.len(), input.display());
    analyze_and_write(ctx, &records)
}

fn cmd_fetch(ctx: &RunContext, args: &FetchArgs) -> Result<()> {
    let config = &ctx.config;
    let days = args.days.unwrap_or(config.fetch.days);
    let mut retry = config.retry_policy();
    if let Some(max_retries) = args.max_retries {
        retry.max_attempts = max_retries.max(1);
    }

    let mut query = SearchQuery::last_days(
        &config.analysis.target_hashtag,
        days,
        Utc::now().date_naive(),
    )
    .with_count(config.fetch.page_size);
    if !config.fetch.lang.is_empty() {
        query = query.with_lang(config.fetch.lang.clone());
    }
    info!("Searching for '{}'", query.q);

    let spinner = fetch_spinner(ctx.quiet);
    let reporter = SpinnerReporter { spinner: &spinner };
    let fetched = HttpSearchClient::from_env(&config.fetch.api_base, config.fetch_timeout())
        .and_then(|client| {
            Fetcher::new(client, retry, config.fetch.max_pages).fetch_all(&query, &reporter)
        });
    spinner.finish_and_clear();

    match fetched {
        Ok(records) => {
            let save_to = args
                .save_to
                .clone()
                .unwrap_or_else(|| config.fetched_path());
            save_records(&save_to, &records)?;
            info!("Saved {} fetched tweets to {}", records.len(), save_to.display());
            analyze_and_write(ctx, &records)
        }
        Err(err) => {
            error!("Fetch failed, writing empty results: {err}");
            analyze_and_write(ctx, &[])?;
            Err(StatsError::from(err).into())
        }
    }
}

fn analyze_and_write(ctx: &RunContext, records: &[RawRecord]) -> Result<()> {
    let pipeline = ctx.config.pipeline();
    let reporter = TracingReporter;

    let guard = OperationGuard::new("analyze");
    let (flat, report) = pipeline.run_detailed(records, &reporter);
    guard.complete();

    let output_dir = ctx.config.output_dir();
    let guard = OperationGuard::new("write results");
    let outputs = match write_report(&output_dir, &report, &reporter) {
        Ok(outputs) => {
            guard.complete();
            outputs
        }
        Err(err) => {
            guard.fail(&err);
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to write results to {}", output_dir.display())));
        }
    };

    let summary = RunSummary {
        target: pipeline.target(),
        input_records: records.len(),
        matching_records: flat.len(),
        report: &report,
        outputs: &outputs,
    };
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text if !ctx.quiet => print_text_summary(&summary, &flat),
        OutputFormat::Text => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct RunSummary<'a> {
    target: &'a str,
    input_records: usize,
    matching_records: usize,
    report: &'a AnalysisReport,
    outputs: &'a OutputPaths,
}

const USERS_SHOWN: usize = 10;

fn print_text_summary(summary: &RunSummary<'_>, flat: &[FlatRecord]) {
    println!(
        "{}",
        format!("Hashtag Analysis: #{}", summary.target.trim_start_matches('#'))
            .bold()
            .cyan()
    );
    println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
    println!(
        "  {:<28} {:>10}",
        "Tweets read:",
        format_number_usize(summary.input_records)
    );
    println!(
        "  {:<28} {:>10}",
        "Matching tweets:",
        format_number_usize(summary.matching_records)
    );

    match &summary.report.general {
        Some(general) => {
            println!(
                "  {:<28} {:>10}",
                "Most active day:",
                general.most_active_day.format("%Y-%m-%d").to_string().green()
            );
            println!(
                "  {:<28} {:>10}",
                format!("Tweets with >={} hashtags:", summary.report.min_hashtags),
                format_number_usize(general.tweets_with_min_hashtags)
            );
            println!(
                "  {:<28} {:>10}",
                "Max tweets by one user:",
                format_number_usize(general.max_tweets_per_user)
            );
            let activity = sparkline_from_daily(&daily_counts(flat), 30);
            println!("  {:<28} {}", "Daily activity:", activity.cyan());
        }
        None => println!("  {}", "No matching tweets.".yellow()),
    }

    if !summary.report.users.is_empty() {
        println!();
        println!(
            "{}",
            format!("Users ({})", format_number_usize(summary.report.users.len())).bold()
        );
        for user in summary.report.users.iter().take(USERS_SHOWN) {
            println!(
                "  {:<20} {:>10} followers  {:>6.1} chars  {}",
                truncate_chars(&user.user_id, 20),
                format_number_u64(user.followers_count),
                user.average_tweet_length,
                user.top_five_hashtags.join(", ").blue()
            );
        }
        let hidden = summary.report.users.len().saturating_sub(USERS_SHOWN);
        if hidden > 0 {
            println!("  {}", format!("... and {hidden} more").dimmed());
        }
    }

    println!();
    println!("  {} {}", "✓".green(), summary.outputs.general.display());
    println!("  {} {}", "✓".green(), summary.outputs.users.display());
}

fn fetch_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Fetching tweets...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Keeps the spinner message current while forwarding to tracing.
struct SpinnerReporter<'a> {
    spinner: &'a ProgressBar,
}

impl Reporter for SpinnerReporter<'_> {
    fn report(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::FetchedPage { page, .. } => {
                self.spinner
                    .set_message(format!("Fetching tweets... page {page}"));
            }
            PipelineEvent::FetchRetry {
                attempt,
                max_attempts,
                ..
            } => {
                self.spinner.set_message(format!(
                    "Timed out, retrying ({attempt}/{max_attempts})..."
                ));
            }
            _ => {}
        }
        self.spinner.suspend(|| TracingReporter.report(event));
    }
}

fn cmd_config(cli: &Cli, ctx: &RunContext, args: &ConfigArgs) -> Result<()> {
    let config = &ctx.config;

    if args.show || !args.init {
        println!("{}", "Current Configuration".bold().cyan());
        println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
        let file = cli.config.clone().or_else(Config::user_config_path);
        println!("  Config file:   {}", display_path(file.as_deref()));
        println!("  Input:         {}", config.input_path().display());
        println!("  Fetched to:    {}", config.fetched_path().display());
        println!("  Output dir:    {}", config.output_dir().display());
        println!("  Target:        #{}", config.analysis.target_hashtag.trim_start_matches('#'));
        println!("  Fetch days:    {}", config.fetch.days);
        println!(
            "  Retries:       {} x {}s",
            config.fetch.max_retries, config.fetch.retry_delay_secs
        );
        let token = if std::env::var_os(BEARER_TOKEN_VAR).is_some() {
            "set".green()
        } else {
            "not set".yellow()
        };
        println!("  {BEARER_TOKEN_VAR}: {token}");
    }
    Ok(())
}

fn init_config_file(path: &Path) -> Result<()> {
    if path.exists() {
        println!(
            "{} Config already exists at {}",
            "•".dimmed(),
            path.display()
        );
        return Ok(());
    }
    Config::default().save_to(path)?;
    println!("{} Wrote default config to {}", "✓".green(), path.display());
    Ok(())
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
}

fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "tweetstats", &mut io::stdout());
    Ok(())
}

fn print_error(err: &anyhow::Error) {
    match err.downcast_ref::<StatsError>() {
        Some(stats_err) => {
            let suggestions: Vec<&str> = stats_err.suggestion().into_iter().collect();
            let title = if matches!(stats_err, StatsError::Fetch(_)) {
                "Fetch failed"
            } else {
                "tweetstats failed"
            };
            eprintln!(
                "{}",
                format_error(title, &format!("{err:#}"), &suggestions)
            );
        }
        None => eprintln!("{}", format_error("tweetstats failed", &format!("{err:#}"), &[])),
    }
}
