//! File persistence: raw tweet JSON in and out, CSV result tables out.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::logging::{PipelineEvent, Reporter};
use crate::model::{AnalysisReport, GeneralStatistics, RawRecord, UserDetail};

/// File name of the single-row general statistics table.
pub const GENERAL_RESULTS_FILE: &str = "general_analysis_results.csv";

/// File name of the per-user table.
pub const USER_RESULTS_FILE: &str = "user_specific_analysis_results.csv";

/// Title of the general table column counting tweets with at least
/// `min_hashtags` hashtags.
#[must_use]
pub fn min_hashtags_header(min_hashtags: usize) -> String {
    format!("Total Tweets with >={min_hashtags} Hashtags")
}

const USER_HEADERS: [&str; 5] = [
    "user_id",
    "followers_count",
    "location",
    "average_tweet_length",
    "top_five_hashtags",
];

#[derive(Serialize)]
struct GeneralRow {
    most_active_day: String,
    tweets_with_min_hashtags: usize,
    max_tweets_per_user: usize,
}

#[derive(Serialize)]
struct UserRow<'a> {
    user_id: &'a str,
    followers_count: u64,
    location: &'a str,
    average_tweet_length: f64,
    top_five_hashtags: String,
}

/// Where [`write_report`] put the two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub general: PathBuf,
    pub users: PathBuf,
}

/// Load a JSON array of raw tweets.
///
/// A file that is empty or only whitespace counts as an empty array.
///
/// # Errors
///
/// [`StatsError::InputNotFound`] if the file does not exist,
/// [`StatsError::InvalidInput`] if it is not a JSON array.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StatsError::input_not_found(path),
        _ => StatsError::path_error("read", path, e),
    })?;

    if content.trim().is_empty() {
        debug!("{} is empty, treating as no tweets", path.display());
        return Ok(Vec::new());
    }

    let records: Vec<RawRecord> = serde_json::from_str(&content)
        .map_err(|e| StatsError::invalid_input(path, e.to_string()))?;
    debug!("Loaded {} tweets from {}", records.len(), path.display());
    Ok(records)
}

/// Write raw tweets as a pretty-printed JSON array, creating parent dirs.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn save_records(path: &Path, records: &[RawRecord]) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer
        .flush()
        .map_err(|e| StatsError::path_error("write", path, e))
}

/// Write the general statistics table. `None` writes only the header.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_general_csv(
    path: &Path,
    stats: Option<&GeneralStatistics>,
    min_hashtags: usize,
) -> Result<usize> {
    let mut writer = csv_writer(path)?;
    writer.write_record([
        "Most Active Day",
        &min_hashtags_header(min_hashtags),
        "Max Tweets by Single User",
    ])?;

    if let Some(stats) = stats {
        writer.serialize(GeneralRow {
            most_active_day: stats.most_active_day.format("%Y-%m-%d").to_string(),
            tweets_with_min_hashtags: stats.tweets_with_min_hashtags,
            max_tweets_per_user: stats.max_tweets_per_user,
        })?;
    }

    writer.flush().map_err(|e| StatsError::path_error("write", path, e))?;
    Ok(usize::from(stats.is_some()))
}

/// Write the per-user table; hashtags are stored as a JSON array string.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_user_csv(path: &Path, users: &[UserDetail]) -> Result<usize> {
    let mut writer = csv_writer(path)?;
    writer.write_record(USER_HEADERS)?;

    for user in users {
        writer.serialize(UserRow {
            user_id: &user.user_id,
            followers_count: user.followers_count,
            location: &user.location,
            average_tweet_length: user.average_tweet_length,
            top_five_hashtags: serde_json::to_string(&user.top_five_hashtags)?,
        })?;
    }

    writer.flush().map_err(|e| StatsError::path_error("write", path, e))?;
    Ok(users.len())
}

/// Write both tables into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn write_report(
    dir: &Path,
    report: &AnalysisReport,
    reporter: &dyn Reporter,
) -> Result<OutputPaths> {
    let paths = OutputPaths {
        general: dir.join(GENERAL_RESULTS_FILE),
        users: dir.join(USER_RESULTS_FILE),
    };

    let rows = write_general_csv(&paths.general, report.general.as_ref(), report.min_hashtags)?;
    reporter.report(&PipelineEvent::Saved {
        path: paths.general.clone(),
        rows,
    });

    let rows = write_user_csv(&paths.users, &report.users)?;
    reporter.report(&PipelineEvent::Saved {
        path: paths.users.clone(),
        rows,
    });

    Ok(paths)
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StatsError::path_error("create", parent, e))?;
    }
    File::create(path).map_err(|e| StatsError::path_error("create", path, e))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = create_file(path)?;
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryReporter;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn user(id: &str, location: &str, tags: &[&str]) -> UserDetail {
        UserDetail {
            user_id: id.to_string(),
            followers_count: 100,
            location: location.to_string(),
            average_tweet_length: 15.0,
            top_five_hashtags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[test]
    fn load_records_reads_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tweets.json");
        let sample = json!([{
            "created_at": "Wed Sep 29 20:35:16 +0000 2021",
            "text": "This is a tweet",
            "entities": {"hashtags": [{"text": "FlixBus"}]},
            "user": {"id_str": "123", "followers_count": 100, "location": "Germany"}
        }]);
        fs::write(&path, sample.to_string()).unwrap();

        let records = load_records(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_value()["text"], "This is a tweet");
    }

    #[test]
    fn load_records_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tweets.json");
        fs::write(&path, "  \n").unwrap();
        assert!(load_records(&path).unwrap().is_empty());
    }

    #[test]
    fn load_records_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_records(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StatsError::InputNotFound { .. }));
    }

    #[test]
    fn load_records_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tweets.json");
        fs::write(&path, r#"{"statuses": []}"#).unwrap();
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput { .. }));
    }

    #[test]
    fn save_then_load_keeps_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw").join("tweets_api.json");
        let records = vec![RawRecord(json!({"text": "x", "lang": "en", "extra": [1, 2]}))];

        save_records(&path, &records).unwrap();

        assert_eq!(load_records(&path).unwrap(), records);
    }

    #[test]
    fn general_csv_has_one_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(GENERAL_RESULTS_FILE);
        let stats = GeneralStatistics {
            most_active_day: NaiveDate::from_ymd_opt(2021, 9, 29).unwrap(),
            tweets_with_min_hashtags: 4,
            max_tweets_per_user: 2,
        };

        let rows = write_general_csv(&path, Some(&stats), 3).unwrap();

        assert_eq!(rows, 1);
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Most Active Day,Total Tweets with >=3 Hashtags,Max Tweets by Single User",
                "2021-09-29,4,2",
            ]
        );
    }

    #[test]
    fn general_csv_header_names_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(GENERAL_RESULTS_FILE);
        let stats = GeneralStatistics {
            most_active_day: NaiveDate::from_ymd_opt(2021, 9, 29).unwrap(),
            tweets_with_min_hashtags: 0,
            max_tweets_per_user: 1,
        };

        write_general_csv(&path, Some(&stats), 4).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(&reader.headers().unwrap()[1], "Total Tweets with >=4 Hashtags");
    }

    #[test]
    fn general_csv_empty_is_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(GENERAL_RESULTS_FILE);
        assert_eq!(write_general_csv(&path, None, 3).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn user_csv_quotes_hashtag_lists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(USER_RESULTS_FILE);
        let users = vec![user("1", "Berlin, DE", &["FlixBus", "travel"]), user("2", "", &[])];

        write_user_csv(&path, &users).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), USER_HEADERS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "Berlin, DE");
        assert_eq!(&rows[0][3], "15.0");
        assert_eq!(&rows[0][4], r#"["FlixBus","travel"]"#);
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][4], "[]");
    }

    #[test]
    fn write_report_creates_directory_and_reports() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("data").join("processed");
        let reporter = MemoryReporter::new();

        let paths = write_report(&out, &AnalysisReport::default(), &reporter).unwrap();

        assert!(paths.general.exists());
        assert!(paths.users.exists());
        assert_eq!(
            reporter.events(),
            vec![
                PipelineEvent::Saved {
                    path: paths.general.clone(),
                    rows: 0
                },
                PipelineEvent::Saved {
                    path: paths.users.clone(),
                    rows: 0
                },
            ]
        );
    }
}
