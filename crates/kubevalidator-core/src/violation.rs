//! # Violation Records
//!
//! The uniform shape every structural validator's output is normalized to
//! before localization and annotation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::LogicalPath;

/// The constraint family a violation belongs to.
///
/// Localization picks a strategy per kind; annotation building only uses
/// [`ViolationKind::as_str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required property is missing from the object at the path.
    Required,
    /// The value at the path has the wrong JSON type.
    InvalidType,
    /// The object at the path carries properties the schema forbids.
    AdditionalProperties {
        /// The offending property names, in validator order.
        unexpected: Vec<String>,
    },
    /// The value is not one of the allowed values.
    Enum,
    /// The value must equal a constant.
    Const,
    /// A numeric bound was crossed.
    Range,
    /// A string length, item count or property count limit was crossed.
    Length,
    /// A string does not match the required pattern.
    Pattern,
    /// A string does not match the required format.
    Format,
    /// Anything else (combinators, uniqueness, ...).
    Other,
}

impl ViolationKind {
    /// Stable identifier for logs and raw details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidType => "invalid_type",
            Self::AdditionalProperties { .. } => "additional_property_not_allowed",
            Self::Enum => "enum",
            Self::Const => "const",
            Self::Range => "number_out_of_range",
            Self::Length => "length_out_of_range",
            Self::Pattern => "pattern",
            Self::Format => "format",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed constraint, as reported by a structural validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Zero-based index of the YAML document within the file.
    pub document: usize,
    /// Where in the document the constraint failed.
    pub path: LogicalPath,
    /// Human-readable validator message.
    pub message: String,
    /// Constraint family.
    pub violation: ViolationKind,
    /// `kind` of the resource being validated.
    pub resource_kind: String,
    /// `apiVersion` of the resource being validated.
    pub api_version: String,
    /// Structured explanation; ordered by key.
    pub details: BTreeMap<String, String>,
}

impl ViolationRecord {
    /// Raw detail text: one `* key: value` line per entry, sorted by key.
    pub fn detail_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.details {
            out.push_str(&format!("* {key}: {value}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(details: &[(&str, &str)]) -> ViolationRecord {
        ViolationRecord {
            document: 0,
            path: LogicalPath::new(["spec", "replicas"]),
            message: "too many".into(),
            violation: ViolationKind::Range,
            resource_kind: "Deployment".into(),
            api_version: "apps/v1".into(),
            details: details
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn detail_string_is_sorted_by_key() {
        let rendered = record(&[("max", "5"), ("found", "7")]).detail_string();
        assert_eq!(rendered, "* found: 7\n* max: 5\n");
    }

    #[test]
    fn detail_string_empty_without_details() {
        assert_eq!(record(&[]).detail_string(), "");
    }

    #[test]
    fn kind_identifiers_are_stable() {
        assert_eq!(ViolationKind::Required.to_string(), "required");
        assert_eq!(
            ViolationKind::AdditionalProperties { unexpected: vec!["x".into()] }.as_str(),
            "additional_property_not_allowed"
        );
    }
}
