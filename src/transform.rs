//! Raw tweets → flat records.
//!
//! Every record goes through [`crate::validate::validate`] first; malformed
//! tweets are reported and dropped instead of aborting the batch.

use crate::logging::{PipelineEvent, Reporter};
use crate::model::{FlatRecord, RawRecord, ValidatedRecord};
use crate::validate::validate;

/// Whether any hashtag equals `target`, ignoring case.
#[must_use]
pub fn is_target_hashtag(hashtags: &[String], target: &str) -> bool {
    let target = target.trim_start_matches('#').to_lowercase();
    hashtags.iter().any(|tag| tag.to_lowercase() == target)
}

/// Flatten a validated tweet into the analysis row.
#[must_use]
pub fn flatten(record: &ValidatedRecord) -> FlatRecord {
    FlatRecord {
        datetime: record.created_at,
        hashtags: record.hashtags.clone(),
        is_retweet: record.is_retweet,
        user_id: record.user_id.clone(),
        followers_count: record.followers_count,
        location: record.location.clone(),
        tweet_length: record.text.chars().count(),
    }
}

/// Validate, filter on `target`, and flatten `records`.
///
/// Output keeps input order. Rejected records are reported one by one and in
/// the closing [`PipelineEvent::Transformed`] summary.
pub fn transform(records: &[RawRecord], target: &str, reporter: &dyn Reporter) -> Vec<FlatRecord> {
    reporter.report(&PipelineEvent::Started {
        total: records.len(),
    });

    let mut valid = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match validate(record) {
            Ok(validated) => valid.push(validated),
            Err(violation) => reporter.report(&PipelineEvent::Rejected { index, violation }),
        }
    }
    let rejected = records.len() - valid.len();

    if valid.is_empty() {
        reporter.report(&PipelineEvent::NoValidRecords {
            total: records.len(),
        });
        return Vec::new();
    }

    let flat: Vec<FlatRecord> = valid
        .iter()
        .filter(|record| is_target_hashtag(&record.hashtags, target))
        .map(flatten)
        .collect();

    reporter.report(&PipelineEvent::Transformed {
        valid: valid.len(),
        rejected,
        retained: flat.len(),
    });
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryReporter;
    use serde_json::json;

    fn tweet(user: &str, tags: &[&str], text: &str) -> RawRecord {
        let hashtags: Vec<_> = tags.iter().map(|t| json!({"text": t})).collect();
        RawRecord(json!({
            "created_at": "Wed Sep 29 20:35:16 +0000 2021",
            "entities": {"hashtags": hashtags},
            "user": {"id_str": user, "followers_count": 10, "location": "Berlin"},
            "text": text
        }))
    }

    #[test]
    fn target_match_is_case_insensitive_and_exact() {
        let tags = vec!["FlixBus".to_string()];
        assert!(is_target_hashtag(&tags, "flixbus"));
        assert!(is_target_hashtag(&tags, "#FLIXBUS"));
        assert!(!is_target_hashtag(&["FlixBusGermany".to_string()], "flixbus"));
        assert!(!is_target_hashtag(&[], "flixbus"));
    }

    #[test]
    fn transform_preprocesses_single_tweet() {
        let reporter = MemoryReporter::new();
        let records = vec![RawRecord(json!({
            "created_at": "Fri May 27 20:43:37 +0000 2022",
            "entities": {"hashtags": [{"text": "FlixBus"}]},
            "retweeted_status": null,
            "user": {"id_str": "1", "followers_count": 100, "location": "NYC"},
            "text": "Test tweet"
        }))];

        let flat = transform(&records, "flixbus", &reporter);

        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].user_id, "1");
        assert_eq!(flat[0].followers_count, 100);
        assert_eq!(flat[0].tweet_length, "Test tweet".len());
        assert!(flat[0].is_retweet);
        assert_eq!(flat[0].hashtags, vec!["FlixBus"]);
    }

    #[test]
    fn transform_filters_and_keeps_order() {
        let reporter = MemoryReporter::new();
        let records = vec![
            tweet("a", &["flixbus"], "one"),
            tweet("b", &["rust"], "two"),
            tweet("c", &["travel", "FLIXBUS"], "three"),
        ];

        let flat = transform(&records, "flixbus", &reporter);

        let users: Vec<_> = flat.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["a", "c"]);
        assert_eq!(flat[1].hashtags, vec!["travel", "FLIXBUS"]);
        assert!(flat.len() <= records.len());
        assert!(flat.iter().all(|r| is_target_hashtag(&r.hashtags, "flixbus")));
    }

    #[test]
    fn malformed_record_is_excluded_not_fatal() {
        let reporter = MemoryReporter::new();
        let records = vec![
            tweet("a", &["FlixBus"], "ok"),
            RawRecord(json!({
                "created_at": "Wed Sep 29 20:35:16 +0000 2021",
                "entities": {"hashtags": [{"text": "FlixBus"}]},
                "user": {"followers_count": 3},
                "text": "no id"
            })),
            RawRecord(json!({"text": "no schema"})),
        ];

        let flat = transform(&records, "flixbus", &reporter);

        assert_eq!(flat.len(), 1);
        assert_eq!(reporter.rejected_count(), 2);
        assert!(reporter.events().contains(&PipelineEvent::Transformed {
            valid: 1,
            rejected: 2,
            retained: 1,
        }));
    }

    #[test]
    fn no_valid_records_reports_and_returns_empty() {
        let reporter = MemoryReporter::new();
        let records = vec![RawRecord(json!({"id": 1}))];

        let flat = transform(&records, "flixbus", &reporter);

        assert!(flat.is_empty());
        assert!(
            reporter
                .events()
                .contains(&PipelineEvent::NoValidRecords { total: 1 })
        );
    }

    #[test]
    fn empty_input_is_fine() {
        let reporter = MemoryReporter::new();
        assert!(transform(&[], "flixbus", &reporter).is_empty());
    }

    #[test]
    fn tweet_length_counts_characters_not_bytes() {
        let reporter = MemoryReporter::new();
        let records = vec![tweet("a", &["flixbus"], "Grüße 🚌")];
        let flat = transform(&records, "flixbus", &reporter);
        assert_eq!(flat[0].tweet_length, 7);
    }
}
