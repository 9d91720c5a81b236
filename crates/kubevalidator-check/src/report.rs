//! # Report Aggregation
//!
//! Folds per-candidate annotation lists into one [`Report`]. Every function
//! here is pure: given the same outcomes and timestamps the report is
//! byte-for-byte identical, whatever order candidates finished in.

use kubevalidator_core::{dedup_annotations, Annotation, Conclusion, FileRef, Report, Timestamp};

use crate::context::RepoContext;

/// Name of the check as shown by CI.
pub const CHECK_RUN_NAME: &str = "Kubernetes YAML";

/// Title and summary of a run that has not finished.
pub const IN_PROGRESS: &str = "Validating...";

/// Title of a run with no candidates.
pub const NO_FILES: &str = "No files to validate";

const CONFIG_MISSING: &str = "No configuration";
const CONFIG_INVALID: &str = "Configuration invalid";
const DOCUMENTATION_URL: &str = "https://github.com/urcomputeringpal/kubevalidator#configuration";

/// The annotations produced for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOutcome {
    pub file: FileRef,
    pub annotations: Vec<Annotation>,
}

/// A run that has started.
pub fn in_progress(started_at: Timestamp) -> Report {
    Report::in_progress(IN_PROGRESS, IN_PROGRESS, started_at)
}

/// Markdown link to `path`, or the bare path in backticks when no link can
/// be built.
fn link(path: &str, url: Option<String>) -> String {
    match url {
        Some(url) => format!("[`{path}`]({url})"),
        None => format!("`{path}`"),
    }
}

fn configuration_guidance(ctx: &RepoContext) -> String {
    format!(
        "kubevalidator needs a tiny bit of configuration to know where to find the Kubernetes YAML in your Repository.\n\n\
         1. Check out the [documentation and examples]({DOCUMENTATION_URL}).\n\
         1. Add your configuration to {}\n\
         1. Profit???",
        link(ctx.config_path(), ctx.new_file_url(ctx.config_path()))
    )
}

/// The repository has no configuration file.
pub fn config_missing(ctx: &RepoContext, started_at: Timestamp, completed_at: Timestamp) -> Report {
    Report::completed(
        Conclusion::Neutral,
        CONFIG_MISSING,
        configuration_guidance(ctx),
        Vec::new(),
        started_at,
        completed_at,
    )
}

/// The configuration file exists but cannot be used.
pub fn config_invalid(
    ctx: &RepoContext,
    mut annotations: Vec<Annotation>,
    started_at: Timestamp,
    completed_at: Timestamp,
) -> Report {
    dedup_annotations(&mut annotations);
    Report::completed(
        Conclusion::Failure,
        CONFIG_INVALID,
        configuration_guidance(ctx),
        annotations,
        started_at,
        completed_at,
    )
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// `N file(s) checked, M error(s)`.
pub fn summary_title(files: usize, errors: usize) -> String {
    format!(
        "{files} {} checked, {errors} {}",
        plural(files, "file", "files"),
        plural(errors, "error", "errors")
    )
}

/// The verdict for a completed run.
pub fn final_report(
    ctx: &RepoContext,
    mut outcomes: Vec<CandidateOutcome>,
    started_at: Timestamp,
    completed_at: Timestamp,
) -> Report {
    if outcomes.is_empty() {
        let summary = format!(
            "To save CPU resources, kubevalidator only validates changes to files that a) are associated with an open Pull Request and b) match the configuration in {}.",
            link(ctx.config_path(), ctx.blob_url(ctx.config_path()))
        );
        return Report::completed(Conclusion::Neutral, NO_FILES, summary, Vec::new(), started_at, completed_at);
    }

    outcomes.sort_by(|a, b| a.file.path().cmp(b.file.path()));
    let files = outcomes.len();
    let summary = outcomes
        .iter()
        .map(|outcome| outcome.file.markdown_list_item())
        .collect::<Vec<_>>()
        .join("\n");

    let mut annotations: Vec<Annotation> = outcomes.into_iter().flat_map(|o| o.annotations).collect();
    dedup_annotations(&mut annotations);

    let conclusion = if annotations.is_empty() {
        Conclusion::Success
    } else {
        Conclusion::Failure
    };
    Report::completed(
        conclusion,
        summary_title(files, annotations.len()),
        summary,
        annotations,
        started_at,
        completed_at,
    )
}
