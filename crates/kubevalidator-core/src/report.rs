//! # Reports
//!
//! The verdict for one validation run. A [`Report`] is either in progress
//! (no conclusion yet) or completed with exactly one [`Conclusion`].
//! Construction is done by the aggregator in `kubevalidator-check`; this
//! module only fixes the shape and its serialized form.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::temporal::Timestamp;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
}

/// Final verdict of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    /// Nothing was checked.
    Neutral,
    /// Every candidate validated cleanly.
    Success,
    /// At least one annotation was produced.
    Failure,
}

impl Conclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conclusion: Option<Conclusion>,
    title: String,
    summary: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
    started_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<Timestamp>,
}

impl Report {
    /// A report for a run that has started but not finished.
    pub fn in_progress(
        title: impl Into<String>,
        summary: impl Into<String>,
        started_at: Timestamp,
    ) -> Self {
        Self {
            status: RunStatus::InProgress,
            conclusion: None,
            title: title.into(),
            summary: summary.into(),
            annotations: Vec::new(),
            started_at,
            completed_at: None,
        }
    }

    /// A completed report. Annotations are stored in the order given.
    pub fn completed(
        conclusion: Conclusion,
        title: impl Into<String>,
        summary: impl Into<String>,
        annotations: Vec<Annotation>,
        started_at: Timestamp,
        completed_at: Timestamp,
    ) -> Self {
        Self {
            status: RunStatus::Completed,
            conclusion: Some(conclusion),
            title: title.into(),
            summary: summary.into(),
            annotations,
            started_at,
            completed_at: Some(completed_at),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// `None` while in progress.
    pub fn conclusion(&self) -> Option<Conclusion> {
        self.conclusion
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// True for a completed report with a failure conclusion.
    pub fn is_failure(&self) -> bool {
        self.conclusion == Some(Conclusion::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{FileRef, LineRange};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn in_progress_has_no_conclusion() {
        let report = Report::in_progress("Validating...", "Validating...", ts("2026-10-19T08:00:00Z"));
        assert_eq!(report.status(), RunStatus::InProgress);
        assert_eq!(report.conclusion(), None);
        assert_eq!(report.completed_at(), None);
        assert!(!report.is_failure());
    }

    #[test]
    fn serializes_snake_case_and_omits_missing_conclusion() {
        let report = Report::in_progress("t", "s", ts("2026-10-19T08:00:00Z"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert!(json.get("conclusion").is_none());
    }

    #[test]
    fn completed_report_round_trips_through_json() {
        let file = FileRef::new("a.yaml", None).unwrap();
        let report = Report::completed(
            Conclusion::Failure,
            "1 file checked, 1 error",
            "* `./a.yaml`",
            vec![Annotation::failure(&file, LineRange::line(4), "t", "m")],
            ts("2026-10-19T08:00:00Z"),
            ts("2026-10-19T08:00:03Z"),
        );
        let text = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
        assert!(back.is_failure());
        assert_eq!(back.annotations()[0].lines().start(), 4);
    }
}
