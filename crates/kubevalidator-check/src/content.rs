//! # Content Sources
//!
//! Retrieval of file contents at a given change. [`WorkingTree`] reads the
//! checked-out files and ignores the ref; [`GitObjects`] reads blobs from
//! the object store with `git show <ref>:<path>`, so a change can be
//! validated without checking it out.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::git::{self, GitError};

/// Error retrieving file contents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The file does not exist at the requested change.
    #[error("{path} not found at {change_ref}")]
    NotFound { path: String, change_ref: String },

    /// Retrieval failed for a reason unrelated to the file's existence.
    #[error("cannot read {path}: {reason}")]
    Transient { path: String, reason: String },
}

/// A provider of file contents.
pub trait ContentSource: Send + Sync {
    /// Raw bytes of `path` as of `change_ref`.
    fn fetch(&self, path: &str, change_ref: &str) -> Result<Vec<u8>, ContentError>;
}

/// Reads files from a directory on disk.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for WorkingTree {
    fn fetch(&self, path: &str, change_ref: &str) -> Result<Vec<u8>, ContentError> {
        std::fs::read(self.root.join(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::NotFound {
                path: path.to_string(),
                change_ref: change_ref.to_string(),
            },
            _ => ContentError::Transient {
                path: path.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// Reads blobs from a git repository's object store.
#[derive(Debug, Clone)]
pub struct GitObjects {
    repo: PathBuf,
}

impl GitObjects {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }
}

/// Phrases git prints when a path or revision does not exist.
const MISSING_OBJECT_MARKERS: &[&str] = &[
    "does not exist in",
    "exists on disk, but not in",
    "invalid object name",
    "unknown revision",
    "bad revision",
];

/// Whether git failed because the object is absent rather than unreadable.
fn is_missing_object(error: &GitError) -> bool {
    let stderr = error.stderr().to_lowercase();
    MISSING_OBJECT_MARKERS.iter().any(|marker| stderr.contains(marker))
}

impl ContentSource for GitObjects {
    fn fetch(&self, path: &str, change_ref: &str) -> Result<Vec<u8>, ContentError> {
        let spec = format!("{change_ref}:{path}");
        git::run(&self.repo, &["show", &spec]).map_err(|e| match &e {
            GitError::Failed { .. } if is_missing_object(&e) => {
                ContentError::NotFound {
                    path: path.to_string(),
                    change_ref: change_ref.to_string(),
                }
            }
            _ => ContentError::Transient {
                path: path.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_tree_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("k8s")).unwrap();
        std::fs::write(dir.path().join("k8s/a.yaml"), "kind: Service\n").unwrap();

        let tree = WorkingTree::new(dir.path());
        assert_eq!(tree.fetch("k8s/a.yaml", "HEAD").unwrap(), b"kind: Service\n");
    }

    #[test]
    fn working_tree_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkingTree::new(dir.path()).fetch("nope.yaml", "HEAD").unwrap_err();
        assert_eq!(
            err,
            ContentError::NotFound {
                path: "nope.yaml".into(),
                change_ref: "HEAD".into()
            }
        );
    }

    #[test]
    fn git_missing_object_messages_are_recognized() {
        let failed = |stderr: &str| GitError::Failed {
            args: "show HEAD:k8s/a.yaml".into(),
            status: "exit status: 128".into(),
            stderr: stderr.into(),
        };
        assert!(is_missing_object(&failed(
            "fatal: path 'k8s/a.yaml' does not exist in 'HEAD'"
        )));
        assert!(is_missing_object(&failed("fatal: Invalid object name 'nope'.")));
        assert!(!is_missing_object(&failed("fatal: not a git repository")));
        assert!(!is_missing_object(&GitError::Spawn {
            args: "show".into(),
            reason: "No such file or directory".into(),
        }));
    }

    #[test]
    fn working_tree_directory_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let err = WorkingTree::new(dir.path()).fetch("sub", "HEAD").unwrap_err();
        assert!(matches!(err, ContentError::Transient { .. }));
    }
}
