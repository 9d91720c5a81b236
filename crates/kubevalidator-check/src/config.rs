//! # Repository Configuration
//!
//! The repository opts in with a `KubeValidatorConfig` document:
//!
//! ```yaml
//! apiVersion: v1alpha1
//! kind: KubeValidatorConfig
//! spec:
//!   manifests:
//!     - glob: config/**/*.yaml
//!       schemas:
//!         - version: 1.10.3
//! ```
//!
//! Each manifest selector pairs a glob with the schema specs that files
//! matching it are validated against. A file matching several selectors
//! is validated against the union of their specs, in configuration order.
//!
//! Problems with the configuration itself are reported as annotations on
//! the configuration file: parse errors at the line the parser stopped,
//! semantic issues at the offending node (found with the line localizer).

use globset::{Glob, GlobSet, GlobSetBuilder};
use kubevalidator_core::{Annotation, FileRef, LineRange, LogicalPath, SchemaSpec};
use kubevalidator_locate::LineLocalizer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required value of the configuration's `kind`.
pub const CONFIG_KIND: &str = "KubeValidatorConfig";

/// The configuration document as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeValidatorConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: ConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSpec {
    #[serde(default)]
    pub manifests: Vec<ManifestSelector>,
}

/// A glob and the schemas its matches are validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSelector {
    #[serde(default)]
    pub glob: String,
    #[serde(default)]
    pub schemas: Vec<SchemaSpec>,
}

/// One semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Node the problem is attached to.
    pub path: LogicalPath,
    pub message: String,
    /// Where the node is in the configuration file.
    pub lines: LineRange,
}

/// The configuration could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not valid YAML, or not the expected shape.
    #[error("cannot parse configuration: {message}")]
    Parse { message: String, lines: LineRange },

    /// Well-formed but semantically invalid.
    #[error("configuration is invalid: {}", summarize(.issues))]
    Invalid { issues: Vec<ConfigIssue> },
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// Annotations on the configuration file describing the problem.
    pub fn annotations(&self, file: &FileRef) -> Vec<Annotation> {
        match self {
            Self::Parse { message, lines } => {
                vec![Annotation::failure(file, *lines, "Unmarshaling error", message.clone())]
            }
            Self::Invalid { issues } => issues
                .iter()
                .map(|issue| {
                    Annotation::failure(file, issue.lines, "Schema validation error", issue.message.clone())
                        .with_raw_details(format!("* field: {}\n", issue.path))
                })
                .collect(),
        }
    }
}

/// A validated configuration, ready to match paths.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    config: KubeValidatorConfig,
    globs: GlobSet,
}

impl ManifestConfig {
    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: KubeValidatorConfig = serde_yaml::from_str(text).map_err(|e| {
            let lines = e
                .location()
                .map(|loc| LineRange::line(loc.line()))
                .unwrap_or(LineRange::FALLBACK);
            ConfigError::Parse {
                message: e.to_string(),
                lines,
            }
        })?;

        let mut issues: Vec<(LogicalPath, String)> = Vec::new();
        if config.kind != CONFIG_KIND {
            issues.push((
                LogicalPath::new(["kind"]),
                format!("kind must be {CONFIG_KIND}, found {:?}", config.kind),
            ));
        }
        if config.spec.manifests.is_empty() {
            issues.push((
                LogicalPath::new(["spec", "manifests"]),
                "spec.manifests must list at least one manifest glob".to_string(),
            ));
        }

        let mut builder = GlobSetBuilder::new();
        for (i, selector) in config.spec.manifests.iter().enumerate() {
            let path = LogicalPath::new(["spec".to_string(), "manifests".to_string(), i.to_string(), "glob".to_string()]);
            if selector.glob.trim().is_empty() {
                issues.push((path, format!("spec.manifests[{i}].glob must not be empty")));
                continue;
            }
            match Glob::new(&selector.glob) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => issues.push((path, format!("invalid glob {:?}: {e}", selector.glob))),
            }
        }

        if !issues.is_empty() {
            let localizer = LineLocalizer::default();
            let issues = issues
                .into_iter()
                .map(|(path, message)| ConfigIssue {
                    lines: localizer.locate(text, 0, &path),
                    path,
                    message,
                })
                .collect();
            return Err(ConfigError::Invalid { issues });
        }

        let globs = builder.build().map_err(|e| ConfigError::Parse {
            message: e.to_string(),
            lines: LineRange::FALLBACK,
        })?;
        Ok(Self { config, globs })
    }

    pub fn config(&self) -> &KubeValidatorConfig {
        &self.config
    }

    /// Schema specs for `path`, or `None` when no selector matches. The
    /// list is the ordered, duplicate-free union over matching selectors;
    /// it is empty when the matching selectors declare no schemas.
    pub fn schemas_for(&self, path: &str) -> Option<Vec<SchemaSpec>> {
        let mut matches = self.globs.matches(path);
        if matches.is_empty() {
            return None;
        }
        matches.sort_unstable();

        let mut schemas: Vec<SchemaSpec> = Vec::new();
        for index in matches {
            for spec in &self.config.spec.manifests[index].schemas {
                if !schemas.contains(spec) {
                    schemas.push(spec.clone());
                }
            }
        }
        Some(schemas)
    }
}
