//! # Line Localizer
//!
//! Structural validators report *where in the data* a constraint failed,
//! never *where in the text*. The localizer recovers the text position:
//!
//! 1. mark the node at the violation's path with a synthetic edit
//!    ([`EditPolicy::operation`]),
//! 2. re-serialize the patched document stream,
//! 3. line-diff the original against the patched text,
//! 4. let the policy read the node's original lines out of the hunks.
//!
//! Any failure along the way (unparsable source, unresolvable path, no
//! recognizable hunk) yields [`LineRange::FALLBACK`]. Localization never
//! fails a validation run.

use kubevalidator_core::{LineNumberMode, LineRange, LogicalPath, ViolationKind, ViolationRecord};

use crate::diff::LineDiff;
use crate::patch;
use crate::policy::{EditPolicy, SentinelReplace};

/// How a violation is mapped to lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalizationStrategy {
    /// Line numbers disabled: always [`LineRange::FALLBACK`].
    Off,
    /// Additional-property violations: locate the first unexpected key
    /// rather than the whole enclosing object.
    UnexpectedProperty,
    /// Locate the node at the violation's path.
    Node,
}

impl LocalizationStrategy {
    /// Strategy for a violation kind under a schema's line-number mode.
    pub fn for_violation(mode: LineNumberMode, kind: &ViolationKind) -> Self {
        match (mode, kind) {
            (LineNumberMode::Off, _) => Self::Off,
            (_, ViolationKind::AdditionalProperties { unexpected }) if !unexpected.is_empty() => {
                Self::UnexpectedProperty
            }
            _ => Self::Node,
        }
    }

    /// The path to mark, or `None` when nothing should be localized.
    pub fn target(&self, violation: &ViolationRecord) -> Option<LogicalPath> {
        match self {
            Self::Off => None,
            Self::Node => Some(violation.path.clone()),
            Self::UnexpectedProperty => match &violation.violation {
                ViolationKind::AdditionalProperties { unexpected } => Some(
                    unexpected
                        .first()
                        .map(|key| violation.path.child(key.as_str()))
                        .unwrap_or_else(|| violation.path.clone()),
                ),
                _ => Some(violation.path.clone()),
            },
        }
    }
}

/// Maps logical paths to line ranges with one [`EditPolicy`].
pub struct LineLocalizer {
    policy: Box<dyn EditPolicy>,
    context: usize,
}

impl std::fmt::Debug for LineLocalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineLocalizer")
            .field("policy", &self.policy.name())
            .field("context", &self.context)
            .finish()
    }
}

impl Default for LineLocalizer {
    fn default() -> Self {
        Self::new(Box::new(SentinelReplace))
    }
}

impl LineLocalizer {
    /// A localizer using `policy` with zero diff context.
    pub fn new(policy: Box<dyn EditPolicy>) -> Self {
        Self { policy, context: 0 }
    }

    /// Set the number of context lines in computed hunks. Selection only
    /// looks at change runs, so this affects diagnostics, not results.
    pub fn with_context(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    /// Name of the configured policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Line range of the node at `path` in document `document` of `source`.
    pub fn locate(&self, source: &str, document: usize, path: &LogicalPath) -> LineRange {
        let pointer = path.to_pointer();
        let patched = match patch::apply(source, document, &pointer, &self.policy.operation()) {
            Ok(patched) => patched,
            Err(e) => {
                tracing::debug!(pointer = %pointer, document, error = %e, "patch failed, using fallback range");
                return LineRange::FALLBACK;
            }
        };

        let hunks = LineDiff::new(self.context).diff(source, &patched);
        match self.policy.select(&hunks) {
            Some(range) => range,
            None => {
                tracing::debug!(
                    pointer = %pointer,
                    document,
                    policy = self.policy.name(),
                    hunks = hunks.len(),
                    "no matching hunk, using fallback range"
                );
                LineRange::FALLBACK
            }
        }
    }

    /// Line range for a violation, honoring the schema's line-number mode
    /// and the per-kind strategy.
    pub fn locate_violation(
        &self,
        source: &str,
        mode: LineNumberMode,
        violation: &ViolationRecord,
    ) -> LineRange {
        let strategy = LocalizationStrategy::for_violation(mode, &violation.violation);
        match strategy.target(violation) {
            Some(path) => self.locate(source, violation.document, &path),
            None => LineRange::FALLBACK,
        }
    }
}
