//! # Annotations
//!
//! A finished, line-anchored diagnostic. Each [`Annotation`] maps one-to-one
//! onto a CI annotation record: file, line range, severity, title, message.
//!
//! ## Invariants
//!
//! - The file path is never empty ([`FileRef::new`] rejects it).
//! - `start <= end` and both are 1-based ([`LineRange::new`] normalizes).
//! - Lists are ordered by (path, start line, end line).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identity of a file in the change set: repository-relative path plus an
/// optional link to the exact blob being validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blob_url: Option<String>,
}

impl FileRef {
    /// Build a file reference; the path must not be empty.
    pub fn new(path: impl Into<String>, blob_url: Option<String>) -> Result<Self, CoreError> {
        let path = path.into();
        if path.is_empty() {
            return Err(CoreError::EmptyPath);
        }
        Ok(Self { path, blob_url })
    }

    /// Repository-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Link to the blob, when the change set provides one.
    pub fn blob_url(&self) -> Option<&str> {
        self.blob_url.as_deref()
    }

    /// Markdown list item linking the file: ``* [`./path`](url)``.
    pub fn markdown_list_item(&self) -> String {
        match &self.blob_url {
            Some(url) => format!("* [`./{}`]({url})", self.path),
            None => format!("* `./{}`", self.path),
        }
    }
}

/// An inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// The range used whenever localization is not possible.
    pub const FALLBACK: LineRange = LineRange { start: 1, end: 1 };

    /// Build a range, clamping to line 1 and ensuring `start <= end`.
    pub fn new(start: usize, end: usize) -> Self {
        let start = start.max(1);
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A single-line range.
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// First line, inclusive.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last line, inclusive.
    pub fn end(&self) -> usize {
        self.end
    }

    /// True for the {1,1} fallback.
    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

impl Default for LineRange {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Severity of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    /// Informational.
    Notice,
    /// Does not fail the check.
    Warning,
    /// Fails the check. Every annotation this pipeline produces uses it.
    Failure,
}

impl AnnotationLevel {
    /// Lower-case name as used by CI annotation APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

/// A line-anchored diagnostic ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blob_url: Option<String>,
    lines: LineRange,
    level: AnnotationLevel,
    title: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_details: Option<String>,
}

impl Annotation {
    /// A failure-severity annotation on `file`.
    pub fn failure(
        file: &FileRef,
        lines: LineRange,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: file.path.clone(),
            blob_url: file.blob_url.clone(),
            lines,
            level: AnnotationLevel::Failure,
            title: title.into(),
            message: message.into(),
            raw_details: None,
        }
    }

    /// Attach raw detail text. Empty text is dropped.
    pub fn with_raw_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.raw_details = (!details.is_empty()).then_some(details);
        self
    }

    /// Repository-relative path of the annotated file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Link to the annotated blob.
    pub fn blob_url(&self) -> Option<&str> {
        self.blob_url.as_deref()
    }

    /// Annotated lines.
    pub fn lines(&self) -> LineRange {
        self.lines
    }

    /// Severity.
    pub fn level(&self) -> AnnotationLevel {
        self.level
    }

    /// Short title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw detail text, if any.
    pub fn raw_details(&self) -> Option<&str> {
        self.raw_details.as_deref()
    }

    /// Compare by (path, start line, end line).
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        (self.path.as_str(), self.lines.start, self.lines.end).cmp(&(
            other.path.as_str(),
            other.lines.start,
            other.lines.end,
        ))
    }
}

/// Stable sort by (path, start line, end line). Annotations at the same
/// position keep their relative order.
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by(Annotation::cmp_position);
}

/// Sort as [`sort_annotations`] and drop exact duplicates, keeping the
/// first occurrence. Duplicates need not be adjacent: distinct annotations
/// can share a position.
pub fn dedup_annotations(annotations: &mut Vec<Annotation>) {
    sort_annotations(annotations);
    let mut kept: Vec<Annotation> = Vec::with_capacity(annotations.len());
    for annotation in annotations.drain(..) {
        let seen = kept
            .iter()
            .rev()
            .take_while(|k| k.cmp_position(&annotation) == Ordering::Equal)
            .any(|k| *k == annotation);
        if !seen {
            kept.push(annotation);
        }
    }
    *annotations = kept;
}
