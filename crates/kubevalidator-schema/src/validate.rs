//! # Structural Validation
//!
//! Validates Kubernetes manifests against the upstream JSON schemas
//! (Draft 4) published per cluster version.
//!
//! ## Flow
//!
//! 1. Split the bytes into YAML documents. Empty documents are skipped but
//!    still counted, so document indices match the source file.
//! 2. Convert each document to JSON and read `kind` / `apiVersion`.
//! 3. Resolve the resource schema URL from the request's location, version
//!    and strictness, fetch it through the [`SchemaSource`] and compile it.
//! 4. Translate every `jsonschema` error into a [`ViolationRecord`].
//!
//! A failure of any step other than 4 means the file could not be
//! validated at all. Those failures are collected into one [`EngineError`]
//! rather than surfacing partial results.
//!
//! ## Call Scope
//!
//! All schema configuration travels in the [`ValidationRequest`]. The only
//! state kept between calls is the compiled-schema cache, keyed by full
//! schema URL; a URL always names the same document.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri, ValidationError, Validator};
use kubevalidator_core::{
    resource_schema_url, JsonPointer, LogicalPath, PathConvention, PlatformVariant, SchemaSpec,
    ViolationKind, ViolationRecord,
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::source::SchemaSource;

/// Everything a validator needs to know about one schema spec for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Repository-relative path, used in logs and error messages.
    pub file: String,
    /// Base location of the schema repository.
    pub location: String,
    /// Cluster version, or `master`.
    pub version: String,
    /// Use the strict schema set (no unknown properties).
    pub strict: bool,
    /// Platform variant the location points at.
    pub variant: PlatformVariant,
}

impl ValidationRequest {
    /// Build a request for `file` from a schema spec.
    pub fn for_spec(file: impl Into<String>, spec: &SchemaSpec) -> Self {
        Self {
            file: file.into(),
            location: spec.location(),
            version: spec.effective_version().to_string(),
            strict: spec.strict(),
            variant: spec.variant(),
        }
    }

    /// URL of the schema for one resource type.
    pub fn schema_url(&self, kind: &str, api_version: &str) -> String {
        resource_schema_url(&self.location, &self.version, self.strict, kind, api_version)
    }
}

/// The validator could not evaluate the input at all.
///
/// Displays a single cause verbatim and several causes as a bullet list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_causes(.causes))]
pub struct EngineError {
    /// `kind` of the first resource that could be read, if any.
    pub kind: Option<String>,
    /// Every failure encountered, in document order.
    pub causes: Vec<String>,
}

impl EngineError {
    /// An error with one cause and no known resource kind.
    pub fn single(cause: impl Into<String>) -> Self {
        Self {
            kind: None,
            causes: vec![cause.into()],
        }
    }
}

fn render_causes(causes: &[String]) -> String {
    if let [only] = causes {
        return only.clone();
    }
    causes
        .iter()
        .map(|c| format!("* {c}"))
        .collect::<Vec<_>>()
        .join("\n\t")
}

/// A structural validation engine.
pub trait StructuralValidator: Send + Sync {
    /// Validate every document in `bytes` against the schemas the request
    /// names. An empty vector means the input conforms.
    fn validate(
        &self,
        bytes: &[u8],
        request: &ValidationRequest,
    ) -> Result<Vec<ViolationRecord>, EngineError>;
}

/// Resolves `$ref`s through the same source the top-level schemas come from.
struct SourceRetriever {
    source: Arc<dyn SchemaSource>,
}

impl Retrieve for SourceRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.source
            .fetch(uri.as_str())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

/// [`StructuralValidator`] backed by the `jsonschema` crate and the
/// per-version Kubernetes schema repositories.
pub struct KubeSchemaValidator {
    source: Arc<dyn SchemaSource>,
    compiled: RwLock<HashMap<String, Arc<Validator>>>,
}

impl std::fmt::Debug for KubeSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSchemaValidator")
            .field("compiled", &self.compiled.read().len())
            .finish_non_exhaustive()
    }
}

impl KubeSchemaValidator {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    fn validator_for(&self, url: &str) -> Result<Arc<Validator>, String> {
        if let Some(hit) = self.compiled.read().get(url) {
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(url, "loading resource schema");
        let schema = self
            .source
            .fetch(url)
            .map_err(|e| format!("Problem loading schema from the network at {url}: {e}"))?;

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft4);
        opts.with_retriever(SourceRetriever {
            source: Arc::clone(&self.source),
        });
        let validator = opts
            .build(&schema)
            .map_err(|e| format!("Problem compiling schema at {url}: {e}"))?;

        let validator = Arc::new(validator);
        self.compiled
            .write()
            .insert(url.to_string(), Arc::clone(&validator));
        Ok(validator)
    }
}

impl StructuralValidator for KubeSchemaValidator {
    fn validate(
        &self,
        bytes: &[u8],
        request: &ValidationRequest,
    ) -> Result<Vec<ViolationRecord>, EngineError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| EngineError::single(format!("{} is not valid UTF-8: {e}", request.file)))?;

        let mut records = Vec::new();
        let mut causes = Vec::new();
        let mut first_kind: Option<String> = None;

        for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
            let yaml = match serde_yaml::Value::deserialize(document) {
                Ok(yaml) => yaml,
                Err(e) => {
                    causes.push(format!("Failed to decode YAML from {}: {e}", request.file));
                    // The parser cannot resynchronize after a syntax error.
                    break;
                }
            };
            if yaml.is_null() {
                continue;
            }
            let instance = match yaml_to_json_value(&yaml) {
                Ok(instance) => instance,
                Err(e) => {
                    causes.push(format!("Failed to convert document {index} to JSON: {e}"));
                    continue;
                }
            };

            let kind = instance.get("kind").and_then(Value::as_str);
            let api_version = instance.get("apiVersion").and_then(Value::as_str);
            if first_kind.is_none() {
                first_kind = kind.map(str::to_string);
            }
            let (kind, api_version) = match (kind, api_version) {
                (Some(kind), Some(api_version)) => (kind, api_version),
                (None, _) => {
                    causes.push("Missing a kind key".to_string());
                    continue;
                }
                (Some(_), None) => {
                    causes.push("Missing an apiVersion key".to_string());
                    continue;
                }
            };

            let url = request.schema_url(kind, api_version);
            let validator = match self.validator_for(&url) {
                Ok(validator) => validator,
                Err(cause) => {
                    causes.push(cause);
                    continue;
                }
            };

            records.extend(
                validator
                    .iter_errors(&instance)
                    .map(|error| to_record(index, kind, api_version, &error)),
            );
        }

        if !causes.is_empty() {
            return Err(EngineError {
                kind: first_kind,
                causes,
            });
        }

        tracing::debug!(
            file = %request.file,
            version = %request.version,
            variant = %request.variant,
            violations = records.len(),
            "structural validation finished"
        );
        Ok(records)
    }
}

/// Normalize one `jsonschema` error.
fn to_record(
    document: usize,
    kind: &str,
    api_version: &str,
    error: &ValidationError<'_>,
) -> ViolationRecord {
    let pointer = error.instance_path.to_string();
    let path = JsonPointer.parse(&pointer).unwrap_or_else(|e| {
        tracing::debug!(pointer = %pointer, error = %e, "unparsable instance path, using root");
        LogicalPath::root()
    });

    let mut details = BTreeMap::new();
    details.insert("field".to_string(), path.to_string());
    details.insert("context".to_string(), path.to_context());

    let found = value_text(&error.instance);
    let violation = match &error.kind {
        ValidationErrorKind::Required { property } => {
            details.insert("property".into(), value_text(property));
            ViolationKind::Required
        }
        ValidationErrorKind::Type { .. } => {
            details.insert("given".into(), json_type_name(&error.instance).into());
            ViolationKind::InvalidType
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            details.insert("property".into(), unexpected.join(", "));
            ViolationKind::AdditionalProperties {
                unexpected: unexpected.clone(),
            }
        }
        ValidationErrorKind::Enum { options } => {
            details.insert("allowed".into(), options.to_string());
            details.insert("found".into(), found);
            ViolationKind::Enum
        }
        ValidationErrorKind::Constant { expected_value } => {
            details.insert("expected".into(), value_text(expected_value));
            details.insert("found".into(), found);
            ViolationKind::Const
        }
        ValidationErrorKind::Minimum { limit } | ValidationErrorKind::ExclusiveMinimum { limit } => {
            details.insert("min".into(), limit.to_string());
            details.insert("found".into(), found);
            ViolationKind::Range
        }
        ValidationErrorKind::Maximum { limit } | ValidationErrorKind::ExclusiveMaximum { limit } => {
            details.insert("max".into(), limit.to_string());
            details.insert("found".into(), found);
            ViolationKind::Range
        }
        ValidationErrorKind::MinLength { limit }
        | ValidationErrorKind::MinItems { limit }
        | ValidationErrorKind::MinProperties { limit } => {
            details.insert("min".into(), limit.to_string());
            ViolationKind::Length
        }
        ValidationErrorKind::MaxLength { limit }
        | ValidationErrorKind::MaxItems { limit }
        | ValidationErrorKind::MaxProperties { limit } => {
            details.insert("max".into(), limit.to_string());
            ViolationKind::Length
        }
        ValidationErrorKind::Pattern { pattern } => {
            details.insert("pattern".into(), pattern.clone());
            details.insert("found".into(), found);
            ViolationKind::Pattern
        }
        ValidationErrorKind::Format { format } => {
            details.insert("format".into(), format.clone());
            details.insert("found".into(), found);
            ViolationKind::Format
        }
        _ => ViolationKind::Other,
    };

    ViolationRecord {
        document,
        message: format!("{path}: {error}"),
        path,
        violation,
        resource_kind: kind.to_string(),
        api_version: api_version.to_string(),
        details,
    }
}

/// Strings unquoted, everything else as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and non-string mapping keys are stringified; manifests
/// only use the JSON-compatible subset of YAML.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
