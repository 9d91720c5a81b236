//! # `kubevalidator check`
//!
//! Validates the manifests a change touches and prints the report.
//!
//! ```bash
//! # Files changed on a pull request branch, read from the git object store:
//! kubevalidator check --base origin/main --head HEAD --format github
//!
//! # Explicit files from the working tree, offline schema mirror:
//! kubevalidator check --schema-dir ./schemas k8s/web.yaml k8s/svc.yaml
//!
//! # Everything the configuration matches:
//! kubevalidator check --all
//! ```
//!
//! With `--base`, file contents come from `git show <head>:<path>` so the
//! change can be checked without checking it out. Otherwise they are read
//! from the working tree under `--repo`.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use kubevalidator_check::{
    git, ChangeSet, ContentSource, GitObjects, Pipeline, RepoContext, WorkingTree,
    DEFAULT_CONFIG_PATH, DEFAULT_JOBS, DEFAULT_SERVER_URL,
};
use kubevalidator_core::Timestamp;
use kubevalidator_schema::{
    CachingSchemaSource, DirectorySchemaSource, HttpSchemaSource, KubeSchemaValidator, SchemaSource,
    DEFAULT_FETCH_TIMEOUT,
};

use crate::output::{render, render_started, OutputFormat};
use crate::{EXIT_FAILURE, EXIT_SUCCESS};

/// Arguments for `kubevalidator check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files to check, relative to the repository root.
    #[arg(conflicts_with_all = ["all", "base"])]
    pub files: Vec<String>,

    /// Repository root.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Configuration file, relative to the repository root.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Check files changed since the merge base with this revision.
    #[arg(long)]
    pub base: Option<String>,

    /// Revision under test.
    #[arg(long, default_value = "HEAD")]
    pub head: String,

    /// Check every file in the working tree.
    #[arg(long, conflicts_with = "base")]
    pub all: bool,

    /// Candidates validated concurrently.
    #[arg(long, default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Serve schemas from a local mirror instead of the network.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// `owner/name` of the hosted repository, used for links.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Base URL of the hosting server.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Branch under test, used for "create configuration" links.
    #[arg(long, env = "GITHUB_HEAD_REF")]
    pub head_branch: Option<String>,
}

impl CheckArgs {
    fn change_set(&self) -> Result<ChangeSet> {
        if !self.files.is_empty() {
            Ok(ChangeSet::Explicit(self.files.clone()))
        } else if self.all {
            Ok(ChangeSet::All)
        } else if let Some(base) = &self.base {
            Ok(ChangeSet::GitDiff {
                base: base.clone(),
                head: self.head.clone(),
            })
        } else {
            bail!("nothing to check: pass files, --all or --base")
        }
    }

    fn schema_source(&self) -> Result<Arc<dyn SchemaSource>> {
        let source: Arc<dyn SchemaSource> = match &self.schema_dir {
            Some(dir) => Arc::new(CachingSchemaSource::new(DirectorySchemaSource::new(dir))),
            None => Arc::new(CachingSchemaSource::new(
                HttpSchemaSource::new(DEFAULT_FETCH_TIMEOUT).context("cannot build schema HTTP client")?,
            )),
        };
        Ok(source)
    }

    fn content_source(&self) -> Arc<dyn ContentSource> {
        if self.base.is_some() {
            Arc::new(GitObjects::new(&self.repo))
        } else {
            Arc::new(WorkingTree::new(&self.repo))
        }
    }

    /// The commit under test. Outside a git repository (plain working tree)
    /// the revision is used as given.
    fn head_ref(&self) -> Result<String> {
        match git::rev_parse(&self.repo, &self.head) {
            Ok(sha) => Ok(sha),
            Err(e) if self.base.is_some() => {
                Err(e).with_context(|| format!("cannot resolve --head {}", self.head))
            }
            Err(e) => {
                tracing::debug!(error = %e, "head is not a git revision, using it verbatim");
                Ok(self.head.clone())
            }
        }
    }

    fn context(&self, head_ref: String) -> RepoContext {
        let mut ctx = RepoContext::new(head_ref)
            .with_server_url(self.server_url.as_str())
            .with_config_path(self.config.as_str());
        if let Some(repository) = &self.repository {
            ctx = ctx.with_repository(repository.as_str());
        }
        if let Some(branch) = &self.head_branch {
            ctx = ctx.with_head_branch(branch.as_str());
        }
        ctx
    }
}

/// Execute `kubevalidator check`. Returns the process exit code.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let changed = args
        .change_set()?
        .resolve(&args.repo)
        .with_context(|| format!("cannot list changed files in {}", args.repo.display()))?;
    let ctx = args.context(args.head_ref()?);
    tracing::debug!(head = ctx.head_ref(), changed = changed.len(), "starting check");

    let pipeline = Pipeline::new(
        args.content_source(),
        Arc::new(KubeSchemaValidator::new(args.schema_source()?)),
    )
    .with_jobs(args.jobs);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;

    if let Some(started) = render_started(Timestamp::now(), args.format)? {
        print!("{started}");
        std::io::stdout().flush().context("cannot write to stdout")?;
    }
    let report = runtime.block_on(pipeline.run(&ctx, &changed))?;

    print!("{}", render(&report, args.format)?);
    Ok(if report.is_failure() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
