//! # kubevalidator-locate: Line Localization
//!
//! Recovers where in the source text a structural violation occurred.
//! Validators only report logical paths; this crate marks the node at the
//! path with a synthetic edit, re-serializes the document and diffs the
//! result against the original text.
//!
//! ## Modules
//!
//! - [`patch`]: one structural edit on one document of a YAML stream.
//! - [`diff`]: Myers line diff with formatting-insensitive comparison.
//! - [`policy`]: how a node is marked and read back ([`EditPolicy`]).
//! - [`localizer`]: the [`LineLocalizer`] tying the three together, and
//!   the per-kind [`LocalizationStrategy`].
//!
//! ## Crate Policy
//!
//! - Localization is total: every input yields a range with
//!   `1 <= start <= end`, falling back to `{1,1}`.
//! - Depends only on `kubevalidator-core` internally.

pub mod diff;
pub mod localizer;
pub mod patch;
pub mod policy;

pub use diff::{ChangeRun, Hunk, HunkLine, LineDiff};
pub use localizer::{LineLocalizer, LocalizationStrategy};
pub use patch::{apply, parse_documents, PatchError, PatchOp};
pub use policy::{EditPolicy, RemoveNode, SentinelReplace, PLACEHOLDER};
