//! Schema validation for raw tweets.
//!
//! Two levels of checking:
//!
//! - [`has_required_fields`] only looks at top-level key presence.
//! - [`validate`] additionally checks every nested value the transformer
//!   reads and returns a typed [`ValidatedRecord`], so nothing downstream can
//!   hit a missing key.

use chrono::{DateTime, FixedOffset, Weekday};
use serde_json::{Map, Value};

use crate::error::SchemaViolation;
use crate::model::{RawRecord, ValidatedRecord};

/// Top-level keys every tweet must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["created_at", "entities", "user", "text"];

/// Timestamp layout used by the search API after its leading weekday:
/// "Fri Jan 09 15:12:21 +0000 2026" without the "Fri ".
pub const TWEET_DATE_FORMAT: &str = "%b %d %H:%M:%S %z %Y";

/// Presence of this key (whatever its value) marks a retweet.
const RETWEET_MARKER: &str = "retweeted_status";

/// True iff all [`REQUIRED_FIELDS`] are present, regardless of their values.
#[must_use]
pub fn has_required_fields(record: &RawRecord) -> bool {
    REQUIRED_FIELDS.iter().all(|field| record.has_key(field))
}

/// Parse the tweet timestamp format, keeping the offset it was written in.
///
/// The leading weekday must be a weekday name but is not checked against
/// the date.
#[must_use]
pub fn parse_tweet_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let (weekday, rest) = date_str.trim().split_once(' ')?;
    weekday.parse::<Weekday>().ok()?;
    DateTime::parse_from_str(rest.trim_start(), TWEET_DATE_FORMAT).ok()
}

/// Check a raw tweet and produce its typed view.
///
/// # Errors
///
/// Returns [`SchemaViolation::MissingFields`] when a required top-level key is
/// absent and [`SchemaViolation::Shape`] when a nested value is missing or has
/// the wrong type.
pub fn validate(record: &RawRecord) -> Result<ValidatedRecord, SchemaViolation> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.has_key(field))
        .collect();
    if !missing.is_empty() {
        return Err(SchemaViolation::MissingFields { missing });
    }

    let tweet = record.as_value();

    let created_at = tweet["created_at"]
        .as_str()
        .ok_or_else(|| SchemaViolation::shape("created_at is not a string"))?;
    let created_at = parse_tweet_date(created_at).ok_or_else(|| {
        SchemaViolation::shape(format!("created_at '{created_at}' is not a tweet timestamp"))
    })?;

    let hashtags = parse_hashtags(&tweet["entities"])?;

    let user = tweet["user"]
        .as_object()
        .ok_or_else(|| SchemaViolation::shape("user is not an object"))?;
    let user_id = user
        .get("id_str")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaViolation::shape("user.id_str is missing or not a string"))?
        .to_string();
    let followers_count = user
        .get("followers_count")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            SchemaViolation::shape("user.followers_count is missing or not a non-negative integer")
        })?;
    let location = parse_location(user)?;

    let text = tweet["text"]
        .as_str()
        .ok_or_else(|| SchemaViolation::shape("text is not a string"))?
        .to_string();

    Ok(ValidatedRecord {
        created_at,
        hashtags,
        is_retweet: record.has_key(RETWEET_MARKER),
        user_id,
        followers_count,
        location,
        text,
    })
}

fn parse_hashtags(entities: &Value) -> Result<Vec<String>, SchemaViolation> {
    let tags = entities
        .get("hashtags")
        .and_then(Value::as_array)
        .ok_or_else(|| SchemaViolation::shape("entities.hashtags is missing or not an array"))?;

    tags.iter()
        .enumerate()
        .map(|(i, tag)| {
            tag.get("text")
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| {
                    SchemaViolation::shape(format!("entities.hashtags[{i}].text is not a string"))
                })
        })
        .collect()
}

/// `location` may be absent or null (the API sends null for unset profiles).
fn parse_location(user: &Map<String, Value>) -> Result<String, SchemaViolation> {
    match user.get("location") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SchemaViolation::shape("user.location is not a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "created_at": "Fri May 27 20:43:37 +0000 2022",
            "entities": {"hashtags": [{"text": "FlixBus"}, {"text": "travel"}]},
            "retweeted_status": null,
            "user": {"id_str": "1", "followers_count": 100, "location": "NYC"},
            "text": "Test tweet"
        })
    }

    #[test]
    fn test_parse_tweet_date() {
        let dt = parse_tweet_date("Fri Jan 09 15:12:21 +0000 2026").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 9);
        assert_eq!(dt.hour(), 15);
        assert!(parse_tweet_date("2026-01-09T15:12:21Z").is_none());
    }

    #[test]
    fn test_parse_tweet_date_keeps_offset() {
        let dt = parse_tweet_date("Thu Sep 30 01:30:00 +0200 2021").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(dt.day(), 30);
        assert_eq!(dt.naive_utc().day(), 29);
    }

    #[test]
    fn test_parse_tweet_date_ignores_weekday_mismatch() {
        // 2021-09-29 was a Wednesday.
        let dt = parse_tweet_date("Mon Sep 29 20:35:16 +0000 2021").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour()), (9, 29, 20));
        assert!(parse_tweet_date("Xyz Sep 29 20:35:16 +0000 2021").is_none());
        assert!(parse_tweet_date("Sep 29 20:35:16 +0000 2021").is_none());
    }

    #[test]
    fn required_fields_present_regardless_of_shape() {
        let record = RawRecord(json!({
            "created_at": 1,
            "entities": "nope",
            "user": null,
            "text": []
        }));
        assert!(has_required_fields(&record));
    }

    #[test]
    fn required_fields_each_one_missing() {
        for field in REQUIRED_FIELDS {
            let mut value = sample();
            value.as_object_mut().unwrap().remove(field);
            let record = RawRecord(value);
            assert!(!has_required_fields(&record), "{field} removed");
            assert_eq!(
                validate(&record),
                Err(SchemaViolation::MissingFields {
                    missing: vec![field]
                })
            );
        }
    }

    #[test]
    fn validate_extracts_typed_fields() {
        let record = validate(&RawRecord(sample())).unwrap();
        assert_eq!(record.hashtags, vec!["FlixBus", "travel"]);
        assert!(record.is_retweet, "null retweeted_status still marks a retweet");
        assert_eq!(record.user_id, "1");
        assert_eq!(record.followers_count, 100);
        assert_eq!(record.location, "NYC");
        assert_eq!(record.text, "Test tweet");
        assert_eq!(record.created_at.year(), 2022);
    }

    #[test]
    fn validate_without_retweet_marker() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("retweeted_status");
        assert!(!validate(&RawRecord(value)).unwrap().is_retweet);
    }

    #[test]
    fn validate_null_location_is_empty() {
        let mut value = sample();
        value["user"]["location"] = Value::Null;
        assert_eq!(validate(&RawRecord(value)).unwrap().location, "");

        let mut value = sample();
        value["user"].as_object_mut().unwrap().remove("location");
        assert_eq!(validate(&RawRecord(value)).unwrap().location, "");
    }

    fn assert_shape_violation(name: &str, mutate: impl Fn(&mut Value)) {
        let mut value = sample();
        mutate(&mut value);
        let result = validate(&RawRecord(value));
        assert!(
            matches!(result, Err(SchemaViolation::Shape { .. })),
            "{name}: {result:?}"
        );
    }

    #[test]
    fn validate_rejects_nested_shape_problems() {
        assert_shape_violation("bad date", |v| v["created_at"] = json!("yesterday"));
        assert_shape_violation("no hashtags", |v| v["entities"] = json!({}));
        assert_shape_violation("hashtag without text", |v| {
            v["entities"]["hashtags"] = json!([{"indices": [0, 3]}]);
        });
        assert_shape_violation("user not object", |v| v["user"] = json!("someone"));
        assert_shape_violation("no id_str", |v| {
            v["user"].as_object_mut().unwrap().remove("id_str");
        });
        assert_shape_violation("negative followers", |v| {
            v["user"]["followers_count"] = json!(-4);
        });
        assert_shape_violation("numeric location", |v| v["user"]["location"] = json!(7));
        assert_shape_violation("text not string", |v| v["text"] = Value::Null);
    }
}
