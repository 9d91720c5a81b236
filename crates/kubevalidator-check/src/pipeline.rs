//! # Check Pipeline
//!
//! One run, end to end:
//!
//! 1. Load and validate the repository configuration. A missing file ends
//!    the run with a neutral report; an unusable one with a failing report
//!    annotated on the configuration file.
//! 2. Match every changed path against the configured globs. Each match
//!    becomes a [`Candidate`] carrying the union of its selectors' specs.
//! 3. Hydrate and validate candidates on the blocking pool, at most `jobs`
//!    at a time. Collaborators are synchronous (git, blocking HTTP bridge),
//!    so each candidate runs inside `spawn_blocking`.
//! 4. Sort the outcomes by path and aggregate them into the final report.
//!
//! Per-file failures, unreadable files included, become annotations. The
//! run only fails when the configuration file itself cannot be read.

use std::sync::Arc;

use kubevalidator_core::{CoreError, Report, Timestamp};
use kubevalidator_locate::LineLocalizer;
use kubevalidator_schema::StructuralValidator;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::candidate::Candidate;
use crate::config::ManifestConfig;
use crate::content::{ContentError, ContentSource};
use crate::context::RepoContext;
use crate::report::{self, CandidateOutcome};

/// Default number of candidates validated concurrently.
pub const DEFAULT_JOBS: usize = 4;

/// A failure that prevents producing a report.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read {path}: {source}")]
    Content {
        path: String,
        #[source]
        source: ContentError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("validation task failed: {0}")]
    Task(String),
}

/// The collaborators of a run.
#[derive(Clone)]
pub struct Pipeline {
    content: Arc<dyn ContentSource>,
    validator: Arc<dyn StructuralValidator>,
    localizer: Arc<LineLocalizer>,
    jobs: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("policy", &self.localizer.policy_name())
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(content: Arc<dyn ContentSource>, validator: Arc<dyn StructuralValidator>) -> Self {
        Self {
            content,
            validator,
            localizer: Arc::new(LineLocalizer::default()),
            jobs: DEFAULT_JOBS,
        }
    }

    pub fn with_localizer(mut self, localizer: LineLocalizer) -> Self {
        self.localizer = Arc::new(localizer);
        self
    }

    /// Bound on concurrent candidates; zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Run the check over `changed` (repository-relative paths).
    pub async fn run(&self, ctx: &RepoContext, changed: &[String]) -> Result<Report, PipelineError> {
        let started_at = Timestamp::now();
        tracing::info!(head = ctx.head_ref(), files = changed.len(), "{}", report::IN_PROGRESS);

        let config_path = ctx.config_path().to_string();
        let config_bytes = match self.content.fetch(&config_path, ctx.head_ref()) {
            Ok(bytes) => bytes,
            Err(ContentError::NotFound { .. }) => {
                tracing::info!(path = %config_path, "no configuration");
                return Ok(report::config_missing(ctx, started_at, Timestamp::now()));
            }
            Err(source) => {
                return Err(PipelineError::Content {
                    path: config_path,
                    source,
                })
            }
        };

        let config = match ManifestConfig::parse(&String::from_utf8_lossy(&config_bytes)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %config_path, error = %e, "configuration invalid");
                let annotations = e.annotations(&ctx.file_ref(&config_path)?);
                return Ok(report::config_invalid(ctx, annotations, started_at, Timestamp::now()));
            }
        };

        let mut candidates = Vec::new();
        for path in changed {
            if let Some(schemas) = config.schemas_for(path) {
                candidates.push(Candidate::new(ctx.file_ref(path)?, ctx.head_ref(), schemas));
            }
        }
        tracing::debug!(candidates = candidates.len(), "matched configuration");

        let outcomes = self.validate_all(candidates).await?;
        let report = report::final_report(ctx, outcomes, started_at, Timestamp::now());
        tracing::info!(
            conclusion = ?report.conclusion(),
            annotations = report.annotations().len(),
            "{}",
            report.title()
        );
        Ok(report)
    }

    async fn validate_all(&self, candidates: Vec<Candidate>) -> Result<Vec<CandidateOutcome>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut tasks = JoinSet::new();

        for mut candidate in candidates {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Task(e.to_string()))?;
            let content = Arc::clone(&self.content);
            let validator = Arc::clone(&self.validator);
            let localizer = Arc::clone(&self.localizer);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                candidate.hydrate(content.as_ref());
                let annotations = candidate.validate(validator.as_ref(), &localizer);
                tracing::debug!(path = candidate.path(), annotations = annotations.len(), "validated");
                CandidateOutcome {
                    file: candidate.file().clone(),
                    annotations,
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| PipelineError::Task(e.to_string()))?;
            outcomes.push(outcome);
        }
        outcomes.sort_by(|a, b| a.file.path().cmp(b.file.path()));
        Ok(outcomes)
    }
}
