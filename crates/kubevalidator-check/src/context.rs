//! # Repository Context
//!
//! Identity of the change being checked: where the repository is hosted,
//! which commit is under test, and where its configuration lives. Used to
//! build blob links for annotations and the links in report summaries.

use kubevalidator_core::{CoreError, FileRef};

/// Default hosting server.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Default repository configuration path.
pub const DEFAULT_CONFIG_PATH: &str = ".github/kubevalidator.yaml";

/// The change under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    server_url: String,
    repository: Option<String>,
    head_ref: String,
    head_branch: Option<String>,
    config_path: String,
}

impl RepoContext {
    /// A context for `head_ref` (a commit SHA or any ref the content
    /// source understands) with default server and config path.
    pub fn new(head_ref: impl Into<String>) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            repository: None,
            head_ref: head_ref.into(),
            head_branch: None,
            config_path: DEFAULT_CONFIG_PATH.to_string(),
        }
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the `owner/name` slug. Links are only built when it is known.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        let repository = repository.into();
        self.repository = (!repository.is_empty()).then_some(repository);
        self
    }

    pub fn with_head_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.head_branch = (!branch.is_empty()).then_some(branch);
        self
    }

    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn head_ref(&self) -> &str {
        &self.head_ref
    }

    pub fn head_branch(&self) -> Option<&str> {
        self.head_branch.as_deref()
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    /// `<server>/<owner>/<repo>/blob/<ref>/<path>`.
    pub fn blob_url(&self, path: &str) -> Option<String> {
        self.repository.as_ref().map(|slug| {
            format!("{}/{slug}/blob/{}/{path}", self.server_url, self.head_ref)
        })
    }

    /// Link that opens the host's "new file" editor for `path` on the head
    /// branch (the head ref when the branch is unknown).
    pub fn new_file_url(&self, path: &str) -> Option<String> {
        let branch = self.head_branch.as_deref().unwrap_or(&self.head_ref);
        self.repository.as_ref().map(|slug| {
            format!("{}/{slug}/new/{branch}?filename={path}", self.server_url)
        })
    }

    /// File reference for `path` at the head ref.
    pub fn file_ref(&self, path: &str) -> Result<FileRef, CoreError> {
        FileRef::new(path, self.blob_url(path))
    }
}
