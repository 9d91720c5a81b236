//! # Change Sets
//!
//! Which files a run considers. Paths are repository-relative with `/`
//! separators, deduplicated and sorted.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::git::{self, GitError};

/// Error resolving a change set.
#[derive(Error, Debug)]
pub enum ChangeSetError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// The set of files to consider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Paths given by the caller.
    Explicit(Vec<String>),
    /// Files added, copied, modified or renamed between two revisions.
    GitDiff { base: String, head: String },
    /// Every file in the working tree.
    All,
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

impl ChangeSet {
    /// The changed paths under `repo`.
    pub fn resolve(&self, repo: &Path) -> Result<Vec<String>, ChangeSetError> {
        let paths: BTreeSet<String> = match self {
            Self::Explicit(paths) => paths
                .iter()
                .map(|p| normalize(p))
                .filter(|p| !p.is_empty())
                .collect(),
            Self::GitDiff { base, head } => git::changed_files(repo, base, head)?
                .iter()
                .map(|p| normalize(p))
                .collect(),
            Self::All => walk(repo)?,
        };
        tracing::debug!(count = paths.len(), "resolved change set");
        Ok(paths.into_iter().collect())
    }
}

fn walk(repo: &Path) -> Result<BTreeSet<String>, ChangeSetError> {
    let mut paths = BTreeSet::new();
    let entries = WalkDir::new(repo)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");
    for entry in entries {
        let entry = entry.map_err(|source| ChangeSetError::Walk {
            path: repo.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(repo) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            paths.insert(parts.join("/"));
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_are_normalized_and_sorted() {
        let set = ChangeSet::Explicit(vec!["./b.yaml".into(), "a\\c.yaml".into(), "b.yaml".into(), String::new()]);
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(set.resolve(dir.path()).unwrap(), vec!["a/c.yaml", "b.yaml"]);
    }

    #[test]
    fn all_walks_the_tree_and_skips_git() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::create_dir_all(dir.path().join("k8s/base")).unwrap();
        std::fs::write(dir.path().join("k8s/base/web.yaml"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let paths = ChangeSet::All.resolve(dir.path()).unwrap();
        assert_eq!(paths, vec!["README.md", "k8s/base/web.yaml"]);
    }
}
