//! # kubevalidator-check: The Check Pipeline
//!
//! Everything between "these files changed" and "here is the verdict":
//!
//! - [`config`]: the repository's `KubeValidatorConfig`, glob matching and
//!   its own validation.
//! - [`changeset`], [`content`], [`git`]: which files changed and how to
//!   read them at the change under test.
//! - [`candidate`]: one matched file, validated against each of its specs.
//! - [`annotate`]: titles, messages and links for annotations.
//! - [`report`]: aggregation into a single [`Report`](kubevalidator_core::Report).
//! - [`pipeline`]: the bounded, concurrent run tying it together.
//!
//! ## Crate Policy
//!
//! - Per-file failures are annotations, never errors. [`PipelineError`] is
//!   reserved for conditions under which no trustworthy report exists.
//! - Report content is independent of scheduling: outcomes are sorted by
//!   path before aggregation.

pub mod annotate;
pub mod candidate;
pub mod changeset;
pub mod config;
pub mod content;
pub mod context;
pub mod git;
pub mod pipeline;
pub mod report;

pub use candidate::Candidate;
pub use changeset::{ChangeSet, ChangeSetError};
pub use config::{ConfigError, ConfigIssue, KubeValidatorConfig, ManifestConfig, ManifestSelector, CONFIG_KIND};
pub use content::{ContentError, ContentSource, GitObjects, WorkingTree};
pub use context::{RepoContext, DEFAULT_CONFIG_PATH, DEFAULT_SERVER_URL};
pub use git::GitError;
pub use pipeline::{Pipeline, PipelineError, DEFAULT_JOBS};
pub use report::{CandidateOutcome, CHECK_RUN_NAME};
