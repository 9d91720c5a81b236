//! # Edit Policies
//!
//! An [`EditPolicy`] decides which synthetic edit marks a node and how the
//! resulting hunks are read back into a line range.
//!
//! - [`SentinelReplace`] (default): replace the node with
//!   [`PLACEHOLDER`]; the node's lines are the original side of the change
//!   run that introduced the placeholder.
//! - [`RemoveNode`]: delete the node; its lines are the first change run
//!   that removes more content than it adds.
//!
//! Both report original-side line numbers. Blank, comment and document
//! marker lines at the edges of a run are dropped, since re-serialization
//! discards them. So is a removed line whose key reappears among the run's
//! other added lines: that line was reformatted (a flow sequence expanded
//! to block style, say), not edited.

use kubevalidator_core::LineRange;
use serde_yaml::Value;

use crate::diff::{ChangeRun, Hunk};
use crate::patch::PatchOp;

/// Marker value injected by [`SentinelReplace`]. It cannot collide with a
/// real manifest value in practice.
pub const PLACEHOLDER: &str = "AAA___KUBEVALIDATOR___PLACEHOLDER___AAA";

/// How a node is marked and found again.
pub trait EditPolicy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The edit applied at the violation's path.
    fn operation(&self) -> PatchOp;

    /// Read the node's original lines out of the diff, if recognizable.
    fn select(&self, hunks: &[Hunk]) -> Option<LineRange>;
}

/// Replace the node with [`PLACEHOLDER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelReplace;

/// Remove the node.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveNode;

fn is_content(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#') && trimmed != "---" && trimmed != "..."
}

/// Mapping key of a line (`ports` for `  ports: [80, 443]`), or the whole
/// trimmed line when it has none.
fn line_key(text: &str) -> &str {
    let trimmed = text.trim();
    let key = match trimmed.split_once(':') {
        Some((key, _)) => key,
        None => trimmed,
    };
    key.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Original-side range of a run, without blank/comment edges and without
/// removed lines that were only reformatted. A run with no removed content
/// (pure insertion) anchors at its insertion point.
fn original_range(run: &ChangeRun<'_>) -> LineRange {
    let reformatted: Vec<&str> = run
        .added
        .iter()
        .filter(|(_, text)| !text.contains(PLACEHOLDER))
        .map(|(_, text)| line_key(text))
        .collect();
    let content: Vec<usize> = run
        .removed
        .iter()
        .filter(|(_, text)| is_content(text))
        .map(|(line, _)| *line)
        .collect();
    let edited: Vec<usize> = run
        .removed
        .iter()
        .filter(|(_, text)| is_content(text) && !reformatted.contains(&line_key(text)))
        .map(|(line, _)| *line)
        .collect();

    // Every removed line reappearing means the key match was too loose;
    // keep the whole run then.
    let lines = if edited.is_empty() { content } else { edited };
    match (lines.first(), lines.last()) {
        (Some(&first), Some(&last)) => LineRange::new(first, last),
        _ => LineRange::line(run.old_anchor),
    }
}

impl EditPolicy for SentinelReplace {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn operation(&self) -> PatchOp {
        PatchOp::Replace(Value::String(PLACEHOLDER.to_string()))
    }

    fn select(&self, hunks: &[Hunk]) -> Option<LineRange> {
        hunks
            .iter()
            .flat_map(Hunk::runs)
            .find(|run| run.added.iter().any(|(_, text)| text.contains(PLACEHOLDER)))
            .map(|run| original_range(&run))
    }
}

impl EditPolicy for RemoveNode {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn operation(&self) -> PatchOp {
        PatchOp::Remove
    }

    fn select(&self, hunks: &[Hunk]) -> Option<LineRange> {
        hunks
            .iter()
            .flat_map(Hunk::runs)
            .find(|run| {
                run.removed.len() > run.added.len()
                    && run.removed.iter().any(|(_, text)| is_content(text))
            })
            .map(|run| original_range(&run))
    }
}
