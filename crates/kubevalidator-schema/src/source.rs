//! # Schema Sources
//!
//! Where resource schemas come from. The validator asks a [`SchemaSource`]
//! for a schema by its full URL; implementations decide whether that means
//! an HTTP GET, a lookup in a local mirror, or a cache hit.
//!
//! ## Implementations
//!
//! - [`HttpSchemaSource`]: fetches over HTTP with `reqwest`. The trait is
//!   synchronous; the call is bridged onto the ambient tokio runtime with
//!   `Handle::block_on`, so it must run on a blocking thread
//!   (`tokio::task::spawn_blocking`), never on an async worker.
//! - [`DirectorySchemaSource`]: maps the URL path onto a directory, for
//!   offline runs and tests.
//! - [`CachingSchemaSource`]: wraps another source. Schema documents are
//!   immutable for a given URL, so successful fetches are kept for the
//!   lifetime of the process. Failures are not cached.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

/// Error fetching a schema document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaFetchError {
    /// No schema exists at the URL (HTTP 404, missing mirror file).
    #[error("schema not found at {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request could not be completed.
    #[error("transport error fetching {url}: {reason}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Underlying error message.
        reason: String,
    },

    /// The document was fetched but is not JSON.
    #[error("schema at {url} is not valid JSON: {reason}")]
    InvalidJson {
        /// The requested URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The URL cannot be mapped onto this source.
    #[error("unsupported schema URL {url}: {reason}")]
    UnsupportedUrl {
        /// The requested URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP source was called outside a tokio runtime.
    #[error("no async runtime available for HTTP request")]
    NoRuntime,
}

/// A provider of schema documents keyed by URL.
pub trait SchemaSource: Send + Sync {
    /// Fetch and parse the schema at `url`.
    fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError>;
}

impl<S: SchemaSource + ?Sized> SchemaSource for std::sync::Arc<S> {
    fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError> {
        (**self).fetch(url)
    }
}

// ─── HTTP ───────────────────────────────────────────────────────────────

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches schemas over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSchemaSource {
    client: reqwest::Client,
}

impl HttpSchemaSource {
    /// Build a source with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, SchemaFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kubevalidator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SchemaFetchError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    async fn fetch_async(&self, url: &str) -> Result<Value, SchemaFetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SchemaFetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SchemaFetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SchemaFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| SchemaFetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| SchemaFetchError::InvalidJson {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl SchemaSource for HttpSchemaSource {
    fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| SchemaFetchError::NoRuntime)?;
        tracing::debug!(url, "fetching schema over HTTP");
        rt.block_on(self.fetch_async(url))
    }
}

// ─── Local mirror ───────────────────────────────────────────────────────

/// Serves schemas from a local directory.
///
/// The URL's scheme and host are dropped and the remaining path is looked
/// up under the root, so a mirror of
/// `https://raw.githubusercontent.com/garethr/kubernetes-json-schema/master`
/// lives at `<root>/garethr/kubernetes-json-schema/master/...`. When that
/// file does not exist, the last two path segments
/// (`<version-dir>/<file>.json`) are tried directly under the root, which
/// lets a single-fork mirror skip the prefix.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, url: &str) -> Result<Vec<PathBuf>, SchemaFetchError> {
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
            None => url,
        };
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(SchemaFetchError::UnsupportedUrl {
                url: url.to_string(),
                reason: "path must be relative without '..' segments".into(),
            });
        }

        let mut candidates = vec![self.root.join(relative)];
        let segments: Vec<&str> = path.rsplitn(3, '/').collect();
        if segments.len() == 3 {
            candidates.push(self.root.join(segments[1]).join(segments[0]));
        }
        Ok(candidates)
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError> {
        for candidate in self.candidates(url)? {
            match std::fs::read_to_string(&candidate) {
                Ok(content) => {
                    tracing::debug!(url, path = %candidate.display(), "schema served from mirror");
                    return serde_json::from_str(&content).map_err(|e| {
                        SchemaFetchError::InvalidJson {
                            url: url.to_string(),
                            reason: e.to_string(),
                        }
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SchemaFetchError::Transport {
                        url: url.to_string(),
                        reason: format!("cannot read {}: {e}", candidate.display()),
                    })
                }
            }
        }
        Err(SchemaFetchError::NotFound {
            url: url.to_string(),
        })
    }
}

// ─── Cache ──────────────────────────────────────────────────────────────

/// Memoizes successful fetches of another source, keyed by full URL.
#[derive(Debug)]
pub struct CachingSchemaSource<S> {
    inner: S,
    cache: RwLock<HashMap<String, Value>>,
}

impl<S: SchemaSource> CachingSchemaSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<S: SchemaSource> SchemaSource for CachingSchemaSource<S> {
    fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError> {
        if let Some(hit) = self.cache.read().get(url) {
            return Ok(hit.clone());
        }
        // Concurrent misses for the same URL may both fetch; the documents
        // are identical so the second insert is harmless.
        let value = self.inner.fetch(url)?;
        self.cache.write().insert(url.to_string(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl SchemaSource for Counting {
        fn fetch(&self, url: &str) -> Result<Value, SchemaFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SchemaFetchError::NotFound { url: url.into() })
            } else {
                Ok(serde_json::json!({ "id": url }))
            }
        }
    }

    #[test]
    fn cache_serves_repeated_urls_once() {
        let source = CachingSchemaSource::new(Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let a = source.fetch("https://x.test/a.json").unwrap();
        let b = source.fetch("https://x.test/a.json").unwrap();
        assert_eq!(a, b);
        source.fetch("https://x.test/b.json").unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let source = CachingSchemaSource::new(Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        assert!(source.fetch("https://x.test/a.json").is_err());
        assert!(source.fetch("https://x.test/a.json").is_err());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert!(source.is_empty());
    }

    #[test]
    fn directory_maps_full_url_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("garethr/kubernetes-json-schema/master/master-standalone");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("service-v1.json"), r#"{"type":"object"}"#).unwrap();

        let source = DirectorySchemaSource::new(dir.path());
        let value = source
            .fetch("https://raw.githubusercontent.com/garethr/kubernetes-json-schema/master/master-standalone/service-v1.json")
            .unwrap();
        assert_eq!(value["type"], "object");
    }

    #[test]
    fn directory_falls_back_to_version_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("v1.10.3-standalone-strict");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("deployment-apps-v1.json"), "{}").unwrap();

        let source = DirectorySchemaSource::new(dir.path());
        assert!(source
            .fetch("https://example.test/acme/kubernetes-json-schema/master/v1.10.3-standalone-strict/deployment-apps-v1.json")
            .is_ok());
    }

    #[test]
    fn directory_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySchemaSource::new(dir.path());
        let err = source.fetch("https://example.test/a/b/c.json").unwrap_err();
        assert!(matches!(err, SchemaFetchError::NotFound { .. }));
    }

    #[test]
    fn directory_rejects_parent_segments() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySchemaSource::new(dir.path());
        let err = source.fetch("https://example.test/../../etc/passwd").unwrap_err();
        assert!(matches!(err, SchemaFetchError::UnsupportedUrl { .. }));
    }

    #[test]
    fn directory_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        let source = DirectorySchemaSource::new(dir.path());
        let err = source.fetch("bad.json").unwrap_err();
        assert!(matches!(err, SchemaFetchError::InvalidJson { .. }));
    }

    #[test]
    fn http_outside_runtime_reports_no_runtime() {
        let source = HttpSchemaSource::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        assert_eq!(
            source.fetch("https://example.test/a.json").unwrap_err(),
            SchemaFetchError::NoRuntime
        );
    }
}
