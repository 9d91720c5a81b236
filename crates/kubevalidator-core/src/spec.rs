//! # Schema Specs
//!
//! A [`SchemaSpec`] is the declarative reference a repository configuration
//! uses to say "validate these manifests against Kubernetes 1.10.3, strict".
//! Resolution is pure: the schema location, the display name and the
//! per-resource schema URL are functions of the spec's fields alone.
//!
//! ## Schema Layout
//!
//! Schemas are published as one repository per platform variant, per fork:
//!
//! ```text
//! https://raw.githubusercontent.com/<fork>/<variant>-json-schema/master
//!     /<version-dir>-standalone[-strict]/<kind>[-<group>]-<version>.json
//! ```
//!
//! where `<version-dir>` is `master` for the unpinned sentinel and
//! `v<version>` otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version sentinel meaning "latest upstream schemas".
pub const UNPINNED_VERSION: &str = "master";

/// Fork used when a spec does not name one.
pub const DEFAULT_SCHEMA_FORK: &str = "garethr";

const SCHEMA_HOST: &str = "https://raw.githubusercontent.com";

/// Which family of resource schemas to validate against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformVariant {
    /// Upstream Kubernetes resource schemas.
    #[default]
    Kubernetes,
    /// OpenShift resource schemas. Older configurations spell this `openstack`.
    #[serde(alias = "openstack")]
    Openshift,
}

impl PlatformVariant {
    /// Name used in schema repository paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Openshift => "openshift",
        }
    }
}

impl fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether violations get line numbers recovered from the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "RawLineNumberMode")]
pub enum LineNumberMode {
    /// Every annotation is anchored at line 1.
    Off,
    /// Localize each violation with the line localizer.
    #[default]
    Default,
}

/// Accepts both `lineNumbers: off|default` and the boolean form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLineNumberMode {
    Flag(bool),
    Named(NamedLineNumberMode),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum NamedLineNumberMode {
    Off,
    Default,
}

impl From<RawLineNumberMode> for LineNumberMode {
    fn from(raw: RawLineNumberMode) -> Self {
        match raw {
            RawLineNumberMode::Flag(true) | RawLineNumberMode::Named(NamedLineNumberMode::Default) => {
                Self::Default
            }
            RawLineNumberMode::Flag(false) | RawLineNumberMode::Named(NamedLineNumberMode::Off) => {
                Self::Off
            }
        }
    }
}

/// A declarative reference to a set of versioned resource schemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    #[serde(default)]
    version: String,
    #[serde(default = "default_fork")]
    schema_fork: String,
    #[serde(default, rename = "type")]
    variant: PlatformVariant,
    #[serde(default = "default_strict")]
    strict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    line_numbers: LineNumberMode,
}

fn default_fork() -> String {
    DEFAULT_SCHEMA_FORK.to_string()
}

fn default_strict() -> bool {
    true
}

impl Default for SchemaSpec {
    fn default() -> Self {
        Self {
            version: UNPINNED_VERSION.to_string(),
            schema_fork: default_fork(),
            variant: PlatformVariant::Kubernetes,
            strict: true,
            name: None,
            line_numbers: LineNumberMode::Default,
        }
    }
}

impl SchemaSpec {
    /// A strict Kubernetes spec pinned to `version`.
    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Replace the schema fork.
    pub fn with_fork(mut self, fork: impl Into<String>) -> Self {
        self.schema_fork = fork.into();
        self
    }

    /// Replace the platform variant.
    pub fn with_variant(mut self, variant: PlatformVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Toggle strict schemas (no unknown properties).
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set an explicit display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the line-number mode.
    pub fn with_line_numbers(mut self, mode: LineNumberMode) -> Self {
        self.line_numbers = mode;
        self
    }

    /// The version as written, possibly empty.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The version used for schema lookup: an empty version means unpinned.
    pub fn effective_version(&self) -> &str {
        if self.version.is_empty() {
            UNPINNED_VERSION
        } else {
            &self.version
        }
    }

    /// True when the spec names a concrete release rather than `master`.
    pub fn is_pinned(&self) -> bool {
        self.effective_version() != UNPINNED_VERSION
    }

    /// The schema fork (GitHub owner of the schema repositories).
    pub fn schema_fork(&self) -> &str {
        &self.schema_fork
    }

    /// The platform variant.
    pub fn variant(&self) -> PlatformVariant {
        self.variant
    }

    /// Whether strict schemas are used.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// The line-number mode.
    pub fn line_numbers(&self) -> LineNumberMode {
        self.line_numbers
    }

    /// Base location of the schema repository for this spec.
    pub fn location(&self) -> String {
        format!(
            "{SCHEMA_HOST}/{}/{}-json-schema/master",
            self.schema_fork, self.variant
        )
    }

    /// Name shown in annotation titles: explicit name, then version, then `master`.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.version.is_empty() => &self.version,
            _ => UNPINNED_VERSION,
        }
    }

    /// `major.minor` of a pinned version, used by API reference links.
    pub fn doc_version(&self) -> Option<String> {
        if !self.is_pinned() {
            return None;
        }
        let version = self.effective_version().trim_start_matches('v');
        let components: Vec<&str> = version.split('.').take(2).collect();
        Some(components.join("."))
    }
}

/// URL of the schema for one resource.
///
/// `api_version` is the resource's `apiVersion` (`v1`, `apps/v1`,
/// `apps.openshift.io/v1`); only the first label of the group contributes.
pub fn resource_schema_url(
    location: &str,
    version: &str,
    strict: bool,
    kind: &str,
    api_version: &str,
) -> String {
    let version_dir = if version.is_empty() || version == UNPINNED_VERSION {
        UNPINNED_VERSION.to_string()
    } else if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    };
    let strict_suffix = if strict { "-strict" } else { "" };

    let mut group_parts = api_version.split('/');
    let first = group_parts.next().unwrap_or_default();
    let first_label = first.split('.').next().unwrap_or_default();
    let mut kind_suffix = format!("-{}", first_label.to_lowercase());
    if let Some(api_group_version) = group_parts.next() {
        kind_suffix.push('-');
        kind_suffix.push_str(&api_group_version.to_lowercase());
    }

    format!(
        "{}/{version_dir}-standalone{strict_suffix}/{}{kind_suffix}.json",
        location.trim_end_matches('/'),
        kind.to_lowercase()
    )
}
