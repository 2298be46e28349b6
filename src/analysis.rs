//! Statistics over the flat tweet table.
//!
//! - Dataset-wide figures (most active day, tweets with many hashtags,
//!   busiest user) that make up [`GeneralStatistics`]
//! - Per-user rollups (latest snapshot, average length, favourite hashtags)
//!   that make up [`UserDetail`]
//!
//! Everything is recomputed from scratch on each call.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{AnalysisReport, DailyCount, FlatRecord, GeneralStatistics, UserDetail};

/// Hashtag count a tweet needs to be counted by [`count_with_min_hashtags`].
pub const MIN_HASHTAGS: usize = 3;

/// Number of hashtags listed per user.
pub const TOP_HASHTAGS: usize = 5;

/// Tunables for [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub min_hashtags: usize,
    pub top_n: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_hashtags: MIN_HASHTAGS,
            top_n: TOP_HASHTAGS,
        }
    }
}

/// Compute both result tables.
#[must_use]
pub fn analyze(records: &[FlatRecord], options: &AnalysisOptions) -> AnalysisReport {
    let general = most_active_day(records).map(|most_active_day| GeneralStatistics {
        most_active_day,
        tweets_with_min_hashtags: count_with_min_hashtags(records, options.min_hashtags),
        max_tweets_per_user: max_records_per_user(records),
    });

    AnalysisReport {
        general,
        users: user_details(records, options.top_n),
        min_hashtags: options.min_hashtags,
    }
}

/// Tweets per calendar day, ascending by date.
#[must_use]
pub fn daily_counts(records: &[FlatRecord]) -> Vec<DailyCount> {
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        *by_day.entry(record.date()).or_default() += 1;
    }
    by_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Day with the most tweets. Ties go to the earliest day.
#[must_use]
pub fn most_active_day(records: &[FlatRecord]) -> Option<NaiveDate> {
    daily_counts(records)
        .into_iter()
        .max_by(|a, b| a.count.cmp(&b.count).then(b.date.cmp(&a.date)))
        .map(|d| d.date)
}

/// Number of tweets carrying at least `min_hashtags` hashtags.
#[must_use]
pub fn count_with_min_hashtags(records: &[FlatRecord], min_hashtags: usize) -> usize {
    records
        .iter()
        .filter(|r| r.hashtags.len() >= min_hashtags)
        .count()
}

/// Highest number of tweets posted by one user (0 for no tweets).
#[must_use]
pub fn max_records_per_user(records: &[FlatRecord]) -> usize {
    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *per_user.entry(record.user_id.as_str()).or_default() += 1;
    }
    per_user.into_values().max().unwrap_or(0)
}

/// The `n` most used hashtags across `records`, most frequent first.
///
/// Equal counts keep the order in which the hashtags were first seen. Hashtags
/// are compared case-sensitively.
#[must_use]
pub fn top_hashtags<'a>(records: impl IntoIterator<Item = &'a FlatRecord>, n: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for tag in records.into_iter().flat_map(|r| r.hashtags.iter()) {
        let slot = *slots.entry(tag.as_str()).or_insert_with(|| {
            counts.push((tag.as_str(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// One row per user.
///
/// Follower count and location come from the user's latest tweet (the first
/// one in input order when timestamps are equal). Rows are ordered by that
/// latest tweet, newest first, then by user id.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn user_details(records: &[FlatRecord], top_n: usize) -> Vec<UserDetail> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&FlatRecord>> = HashMap::new();
    for record in records {
        groups
            .entry(record.user_id.as_str())
            .or_insert_with(|| {
                order.push(record.user_id.as_str());
                Vec::new()
            })
            .push(record);
    }

    let mut rows: Vec<(DateTime<FixedOffset>, UserDetail)> = order
        .into_iter()
        .filter_map(|user_id| {
            let tweets = groups.remove(user_id)?;
            let latest = latest_snapshot(&tweets)?;
            let total_length: usize = tweets.iter().map(|r| r.tweet_length).sum();

            Some((
                latest.datetime,
                UserDetail {
                    user_id: user_id.to_string(),
                    followers_count: latest.followers_count,
                    location: latest.location.clone(),
                    average_tweet_length: total_length as f64 / tweets.len() as f64,
                    top_five_hashtags: top_hashtags(tweets.iter().copied(), top_n),
                },
            ))
        })
        .collect();

    rows.sort_by(|(a_time, a), (b_time, b)| b_time.cmp(a_time).then_with(|| a.user_id.cmp(&b.user_id)));
    rows.into_iter().map(|(_, detail)| detail).collect()
}

fn latest_snapshot<'a>(tweets: &[&'a FlatRecord]) -> Option<&'a FlatRecord> {
    tweets.iter().copied().fold(None, |latest, record| match latest {
        Some(current) if current.datetime >= record.datetime => Some(current),
        _ => Some(record),
    })
}

/// Generate an ASCII sparkline from a slice of values.
///
/// Uses Unicode block characters: ▁▂▃▄▅▆▇█
///
/// # Arguments
/// * `values` - The values to visualize
/// * `width` - Target width (values will be bucketed if len > width)
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sparkline(values: &[usize], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let blocks = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let bucketed: Vec<usize> = if values.len() <= width {
        values.to_vec()
    } else {
        let bucket_size = values.len().div_ceil(width);
        values
            .chunks(bucket_size)
            .map(|chunk| chunk.iter().sum::<usize>() / chunk.len())
            .collect()
    };

    let max = bucketed.iter().copied().max().unwrap_or(1);
    if max == 0 {
        return "▁".repeat(bucketed.len().min(width));
    }

    bucketed
        .iter()
        .take(width)
        .map(|&v| {
            let idx = ((v as f64 / max as f64) * 7.0) as usize;
            blocks[idx.min(7)]
        })
        .collect()
}

/// Generate a sparkline from daily counts.
#[must_use]
pub fn sparkline_from_daily(daily_counts: &[DailyCount], width: usize) -> String {
    let values: Vec<usize> = daily_counts.iter().map(|d| d.count).collect();
    sparkline(&values, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(user: &str, day: u32, hour: u32, tags: &[&str], length: usize) -> FlatRecord {
        FlatRecord {
            datetime: Utc
                .with_ymd_and_hms(2021, 9, day, hour, 0, 0)
                .single()
                .unwrap()
                .fixed_offset(),
            hashtags: tags.iter().map(|t| (*t).to_string()).collect(),
            is_retweet: false,
            user_id: user.to_string(),
            followers_count: u64::from(day) * 10,
            location: format!("city-{day}"),
            tweet_length: length,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, day).unwrap()
    }

    #[test]
    fn most_active_day_picks_busiest_date() {
        let mut records = Vec::new();
        for hour in 0..3 {
            records.push(record("a", 1, hour, &["FlixBus"], 10));
        }
        for hour in 0..5 {
            records.push(record("b", 2, hour, &["FlixBus"], 10));
        }
        assert_eq!(most_active_day(&records), Some(date(2)));
    }

    #[test]
    fn most_active_day_tie_goes_to_earliest() {
        let records = vec![
            record("a", 5, 1, &["FlixBus"], 1),
            record("a", 3, 1, &["FlixBus"], 1),
            record("a", 5, 2, &["FlixBus"], 1),
            record("a", 3, 2, &["FlixBus"], 1),
        ];
        assert_eq!(most_active_day(&records), Some(date(3)));
    }

    #[test]
    fn most_active_day_empty() {
        assert_eq!(most_active_day(&[]), None);
    }

    #[test]
    fn daily_counts_sorted_by_date() {
        let records = vec![
            record("a", 4, 1, &["x"], 1),
            record("a", 2, 1, &["x"], 1),
            record("b", 4, 3, &["x"], 1),
        ];
        let counts = daily_counts(&records);
        assert_eq!(
            counts,
            vec![
                DailyCount { date: date(2), count: 1 },
                DailyCount { date: date(4), count: 2 },
            ]
        );
    }

    #[test]
    fn min_hashtag_count_threshold() {
        let records = vec![
            record("a", 1, 1, &["FlixBus"], 1),
            record("a", 1, 2, &["FlixBus", "b"], 1),
        ];
        assert_eq!(count_with_min_hashtags(&records, 3), 0);

        let records = vec![
            record("a", 1, 1, &["FlixBus", "b", "c"], 1),
            record("a", 1, 2, &["FlixBus", "b", "c", "d"], 1),
            record("a", 1, 3, &["FlixBus"], 1),
        ];
        assert_eq!(count_with_min_hashtags(&records, 3), 2);
    }

    #[test]
    fn averages_and_max_per_user() {
        let records = vec![
            record("A", 1, 1, &["FlixBus"], 10),
            record("A", 1, 2, &["FlixBus"], 20),
            record("B", 1, 3, &["FlixBus"], 5),
        ];

        assert_eq!(max_records_per_user(&records), 2);

        let users = user_details(&records, TOP_HASHTAGS);
        let a = users.iter().find(|u| u.user_id == "A").unwrap();
        let b = users.iter().find(|u| u.user_id == "B").unwrap();
        assert!((a.average_tweet_length - 15.0).abs() < f64::EPSILON);
        assert!((b.average_tweet_length - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_per_user_empty_is_zero() {
        assert_eq!(max_records_per_user(&[]), 0);
    }

    #[test]
    fn top_hashtags_by_frequency_then_first_seen() {
        let records = vec![
            record("u", 1, 1, &["d", "b", "a"], 1),
            record("u", 1, 2, &["c", "a", "e"], 1),
            record("u", 1, 3, &["a", "b", "c", "f"], 1),
        ];

        let top = top_hashtags(&records, 5);

        assert_eq!(top.len(), 5);
        assert_eq!(top[0], "a");
        // b and c both appear twice; b was seen first
        assert_eq!(top[1..3], ["b".to_string(), "c".to_string()]);
        // d, e, f once each; first-seen order keeps d and e
        assert_eq!(top[3..], ["d".to_string(), "e".to_string()]);
    }

    #[test]
    fn top_hashtags_fewer_than_n() {
        let records = vec![record("u", 1, 1, &["FlixBus", "bus"], 1)];
        assert_eq!(top_hashtags(&records, 5), vec!["FlixBus", "bus"]);
    }

    #[test]
    fn top_hashtags_are_case_sensitive() {
        let records = vec![
            record("u", 1, 1, &["FlixBus"], 1),
            record("u", 1, 2, &["flixbus"], 1),
            record("u", 1, 3, &["flixbus"], 1),
        ];
        assert_eq!(top_hashtags(&records, 5), vec!["flixbus", "FlixBus"]);
    }

    #[test]
    fn user_snapshot_is_latest_tweet() {
        let records = vec![
            record("u", 2, 1, &["FlixBus"], 1),
            record("u", 7, 1, &["FlixBus"], 1),
            record("u", 4, 1, &["FlixBus"], 1),
        ];
        let users = user_details(&records, 5);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].followers_count, 70);
        assert_eq!(users[0].location, "city-7");
    }

    #[test]
    fn user_snapshot_tie_keeps_first_seen() {
        let mut first = record("u", 2, 1, &["FlixBus"], 1);
        first.location = "first".into();
        let mut second = record("u", 2, 1, &["FlixBus"], 1);
        second.location = "second".into();

        let users = user_details(&[first, second], 5);
        assert_eq!(users[0].location, "first");
    }

    #[test]
    fn user_rows_newest_first() {
        let records = vec![
            record("old", 1, 1, &["FlixBus"], 1),
            record("new", 9, 1, &["FlixBus"], 1),
            record("mid", 5, 1, &["FlixBus"], 1),
        ];
        let ids: Vec<_> = user_details(&records, 5)
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn analyze_single_record() {
        let records = vec![record("123", 29, 20, &["FlixBus"], 15)];

        let report = analyze(&records, &AnalysisOptions::default());

        let general = report.general.unwrap();
        assert_eq!(general.most_active_day, date(29));
        assert_eq!(general.tweets_with_min_hashtags, 0);
        assert_eq!(general.max_tweets_per_user, 1);
        assert_eq!(report.users.len(), 1);
        assert!((report.users[0].average_tweet_length - 15.0).abs() < f64::EPSILON);
        assert_eq!(report.users[0].top_five_hashtags, vec!["FlixBus"]);
    }

    #[test]
    fn analyze_empty_table() {
        let report = analyze(&[], &AnalysisOptions::default());
        assert!(report.general.is_none());
        assert!(report.users.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_sparkline_empty() {
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn test_sparkline_values() {
        let result = sparkline(&[1, 5, 10, 8, 3, 1], 6);
        assert_eq!(result.chars().count(), 6);
        assert!(result.contains('█'));
        assert!(result.contains('▁'));
    }

    #[test]
    fn test_sparkline_bucketing() {
        let values: Vec<usize> = (1..=12).collect();
        assert_eq!(sparkline(&values, 6).chars().count(), 6);
    }
}
