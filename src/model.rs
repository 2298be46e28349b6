//! Data models for hashtag tweet analysis.
//!
//! [`RawRecord`] is the untouched tweet JSON as returned by the search API or
//! read back from disk. [`FlatRecord`] is the normalized row the statistics
//! are computed from.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tweet exactly as received: an arbitrary JSON value.
///
/// Nothing about its shape is assumed until it passes through
/// [`crate::validate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Value);

impl RawRecord {
    /// Whether `key` is present at the top level (value shape is ignored).
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.0.as_object().is_some_and(|obj| obj.contains_key(key))
    }

    /// Borrow the underlying JSON.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed view of a raw tweet whose nested shape has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub created_at: DateTime<FixedOffset>,
    pub hashtags: Vec<String>,
    pub is_retweet: bool,
    pub user_id: String,
    pub followers_count: u64,
    pub location: String,
    pub text: String,
}

/// A flattened tweet that mentions the target hashtag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub datetime: DateTime<FixedOffset>,
    pub hashtags: Vec<String>,
    pub is_retweet: bool,
    pub user_id: String,
    pub followers_count: u64,
    pub location: String,
    pub tweet_length: usize,
}

impl FlatRecord {
    /// Calendar day the tweet was posted on, in its own UTC offset.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.datetime.date_naive()
    }
}

/// Dataset-wide statistics: the single row of the general results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralStatistics {
    pub most_active_day: NaiveDate,
    pub tweets_with_min_hashtags: usize,
    pub max_tweets_per_user: usize,
}

/// Per-user rollup: one row of the user results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    pub user_id: String,
    /// Follower count from the user's most recent tweet.
    pub followers_count: u64,
    /// Location from the user's most recent tweet.
    pub location: String,
    pub average_tweet_length: f64,
    pub top_five_hashtags: Vec<String>,
}

/// Both result tables of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// `None` when there were no matching tweets.
    pub general: Option<GeneralStatistics>,
    pub users: Vec<UserDetail>,
    /// Threshold behind `general.tweets_with_min_hashtags`.
    pub min_hashtags: usize,
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self {
            general: None,
            users: Vec::new(),
            min_hashtags: crate::analysis::MIN_HASHTAGS,
        }
    }
}

impl AnalysisReport {
    /// True when neither table has any rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.users.is_empty()
    }
}

/// A single day's tweet count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}
