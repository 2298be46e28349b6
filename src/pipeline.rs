//! The in-memory part of a run: raw tweets in, result tables out.

use crate::analysis::{AnalysisOptions, analyze};
use crate::logging::{PipelineEvent, Reporter};
use crate::model::{AnalysisReport, FlatRecord, RawRecord};
use crate::transform::transform;

/// Hashtag tracked when nothing else is configured.
pub const DEFAULT_TARGET_HASHTAG: &str = "flixbus";

/// Validate → transform → analyze.
#[derive(Debug, Clone)]
pub struct Pipeline {
    target: String,
    options: AnalysisOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_HASHTAG, AnalysisOptions::default())
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(target: impl Into<String>, options: AnalysisOptions) -> Self {
        Self {
            target: target.into(),
            options,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Flatten `records`, keeping only tweets tagged with the target hashtag.
    pub fn preprocess(&self, records: &[RawRecord], reporter: &dyn Reporter) -> Vec<FlatRecord> {
        transform(records, &self.target, reporter)
    }

    /// Run every stage over `records`.
    pub fn run(&self, records: &[RawRecord], reporter: &dyn Reporter) -> AnalysisReport {
        self.run_detailed(records, reporter).1
    }

    /// Like [`Pipeline::run`], also handing back the flattened records.
    pub fn run_detailed(
        &self,
        records: &[RawRecord],
        reporter: &dyn Reporter,
    ) -> (Vec<FlatRecord>, AnalysisReport) {
        let flat = self.preprocess(records, reporter);
        let report = analyze(&flat, &self.options);
        reporter.report(&PipelineEvent::Analyzed {
            records: flat.len(),
            users: report.users.len(),
        });
        (flat, report)
    }
}
