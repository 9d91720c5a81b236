//! # Line Diff
//!
//! A Myers line diff (via `similar`) producing unified-diff hunks with line
//! numbers into both inputs.
//!
//! Lines are compared on a normalized key: surrounding whitespace and
//! quote characters are ignored. Re-serializing a YAML document changes
//! indentation of block sequences and quoting of scalars without changing
//! content, and those differences must not show up as changes. Hunk text
//! and line numbers always refer to the unnormalized inputs.

use std::fmt;

use similar::{Algorithm, DiffTag};

/// One line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Present in both inputs.
    Context { old: usize, new: usize, text: String },
    /// Only in the first input.
    Removed { old: usize, text: String },
    /// Only in the second input.
    Added { new: usize, text: String },
}

impl HunkLine {
    pub fn text(&self) -> &str {
        match self {
            Self::Context { text, .. } | Self::Removed { text, .. } | Self::Added { text, .. } => text,
        }
    }

    fn is_change(&self) -> bool {
        !matches!(self, Self::Context { .. })
    }
}

/// A maximal sequence of adjacent removed/added lines inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRun<'h> {
    /// Original-side line number where the run starts (the line before
    /// which added lines were inserted, for a pure insertion).
    pub old_anchor: usize,
    /// `(line number, text)` of removed lines.
    pub removed: Vec<(usize, &'h str)>,
    /// `(line number, text)` of added lines.
    pub added: Vec<(usize, &'h str)>,
}

/// A group of nearby changes with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first original line covered by the hunk.
    pub old_start: usize,
    pub old_len: usize,
    /// 1-based first new line covered by the hunk.
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Split the hunk body into change runs, in order.
    pub fn runs(&self) -> Vec<ChangeRun<'_>> {
        let mut runs = Vec::new();
        let mut old_line = self.old_start;
        let mut current: Option<ChangeRun<'_>> = None;

        for line in &self.lines {
            if !line.is_change() {
                runs.extend(current.take());
            }
            match line {
                HunkLine::Context { old, .. } => old_line = old + 1,
                HunkLine::Removed { old, text } => {
                    current
                        .get_or_insert_with(|| ChangeRun {
                            old_anchor: *old,
                            removed: Vec::new(),
                            added: Vec::new(),
                        })
                        .removed
                        .push((*old, text.as_str()));
                    old_line = old + 1;
                }
                HunkLine::Added { new, text } => {
                    current
                        .get_or_insert_with(|| ChangeRun {
                            old_anchor: old_line,
                            removed: Vec::new(),
                            added: Vec::new(),
                        })
                        .added
                        .push((*new, text.as_str()));
                }
            }
        }
        runs.extend(current);
        runs
    }
}

impl fmt::Display for Hunk {
    /// Unified diff format: `@@ -a,b +c,d @@` followed by prefixed lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )?;
        for line in &self.lines {
            let prefix = match line {
                HunkLine::Context { .. } => ' ',
                HunkLine::Removed { .. } => '-',
                HunkLine::Added { .. } => '+',
            };
            writeln!(f, "{prefix}{}", line.text())?;
        }
        Ok(())
    }
}

/// Line differ with a configurable number of context lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDiff {
    context: usize,
}

fn normalize(line: &str) -> String {
    line.trim().chars().filter(|c| *c != '"' && *c != '\'').collect()
}

impl LineDiff {
    pub fn new(context: usize) -> Self {
        Self { context }
    }

    /// Hunks turning `before` into `after`. Empty when they match.
    pub fn diff(&self, before: &str, after: &str) -> Vec<Hunk> {
        let old: Vec<&str> = before.lines().collect();
        let new: Vec<&str> = after.lines().collect();
        let old_keys: Vec<String> = old.iter().map(|l| normalize(l)).collect();
        let new_keys: Vec<String> = new.iter().map(|l| normalize(l)).collect();

        let ops = similar::capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys);
        let mut hunks = Vec::new();

        for group in similar::group_diff_ops(ops, self.context) {
            let mut lines = Vec::new();
            let mut bounds: Option<(usize, usize, usize, usize)> = None;

            for op in &group {
                let (tag, old_range, new_range) = op.as_tag_tuple();
                if old_range.is_empty() && new_range.is_empty() {
                    continue;
                }
                let b = bounds.get_or_insert((old_range.start, old_range.end, new_range.start, new_range.end));
                b.1 = old_range.end;
                b.3 = new_range.end;

                match tag {
                    DiffTag::Equal => {
                        for (o, n) in old_range.zip(new_range) {
                            lines.push(HunkLine::Context {
                                old: o + 1,
                                new: n + 1,
                                text: old[o].to_string(),
                            });
                        }
                    }
                    DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                        for o in old_range {
                            lines.push(HunkLine::Removed {
                                old: o + 1,
                                text: old[o].to_string(),
                            });
                        }
                        for n in new_range {
                            lines.push(HunkLine::Added {
                                new: n + 1,
                                text: new[n].to_string(),
                            });
                        }
                    }
                }
            }

            if let Some((old_start, old_end, new_start, new_end)) = bounds {
                if lines.iter().any(HunkLine::is_change) {
                    hunks.push(Hunk {
                        old_start: old_start + 1,
                        old_len: old_end - old_start,
                        new_start: new_start + 1,
                        new_len: new_end - new_start,
                        lines,
                    });
                }
            }
        }
        hunks
    }
}
