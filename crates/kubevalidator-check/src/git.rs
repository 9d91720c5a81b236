//! Thin wrapper over the `git` executable.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Error running git.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// The executable could not be started.
    #[error("cannot run git {args}: {reason}")]
    Spawn { args: String, reason: String },

    /// git exited unsuccessfully.
    #[error("git {args} failed ({status}): {stderr}")]
    Failed {
        args: String,
        status: String,
        stderr: String,
    },
}

impl GitError {
    /// stderr of a failed command, empty for spawn failures.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Failed { stderr, .. } => stderr,
            Self::Spawn { .. } => "",
        }
    }
}

/// Run `git <args>` in `repo` and return raw stdout.
pub fn run(repo: &Path, args: &[&str]) -> Result<Vec<u8>, GitError> {
    let out = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| GitError::Spawn {
            args: args.join(" "),
            reason: e.to_string(),
        })?;
    if !out.status.success() {
        return Err(GitError::Failed {
            args: args.join(" "),
            status: out.status.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(out.stdout)
}

/// Resolve a revision to its full object name.
pub fn rev_parse(repo: &Path, rev: &str) -> Result<String, GitError> {
    let out = run(repo, &["rev-parse", "--verify", rev])?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

/// Paths added, copied, modified or renamed between `base` and `head`
/// (three-dot: relative to their merge base).
pub fn changed_files(repo: &Path, base: &str, head: &str) -> Result<Vec<String>, GitError> {
    let range = format!("{base}...{head}");
    let out = run(repo, &["diff", "--name-only", "--diff-filter=ACMR", &range])?;
    Ok(String::from_utf8_lossy(&out)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
