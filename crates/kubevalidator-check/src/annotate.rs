//! # Annotation Builder
//!
//! Turns localized violations, engine failures and load failures into
//! finished [`Annotation`]s. Titles and messages are stable text: CI users
//! grep for them.

use kubevalidator_core::{Annotation, FileRef, LineRange, SchemaSpec, ViolationRecord};
use kubevalidator_schema::EngineError;

const API_REFERENCE: &str = "https://kubernetes.io/docs/reference/generated/kubernetes-api";

const ENGINE_HINT: &str = "This may indicate an incorrect 'apiVersion' or 'kind' field, a missing upstream schema version, or an intermittent error. Details:";

/// Title for a violation of `kind` against the schema named `schema_name`.
pub fn violation_title(kind: &str, schema_name: &str) -> String {
    format!("Error validating {kind} against {schema_name} schema")
}

/// API reference anchor for a resource: `deployment-v1-apps` for
/// `apps/v1` `Deployment`.
fn reference_anchor(kind: &str, api_version: &str) -> String {
    let mut parts: Vec<&str> = api_version.split('/').collect();
    parts.reverse();
    format!("{}-{}", kind.to_lowercase(), parts.join("-"))
}

/// The validator message, with an API reference link appended when the
/// spec pins a version.
pub fn violation_message(spec: &SchemaSpec, violation: &ViolationRecord) -> String {
    match spec.doc_version() {
        Some(doc_version) => format!(
            "{}; see {API_REFERENCE}/v{doc_version}/#{} for more details",
            violation.message,
            reference_anchor(&violation.resource_kind, &violation.api_version)
        ),
        None => violation.message.clone(),
    }
}

/// Annotation for one localized violation.
pub fn violation_annotation(
    file: &FileRef,
    spec: &SchemaSpec,
    violation: &ViolationRecord,
    lines: LineRange,
) -> Annotation {
    Annotation::failure(
        file,
        lines,
        violation_title(&violation.resource_kind, spec.display_name()),
        violation_message(spec, violation),
    )
    .with_raw_details(violation.detail_string())
}

/// Annotation for a validator that could not evaluate the file at all.
pub fn engine_error_annotation(file: &FileRef, spec: &SchemaSpec, error: &EngineError) -> Annotation {
    let (title, message) = match error.kind.as_deref() {
        Some(kind) => (
            format!(
                "Internal error when validating {kind} against {} schemas from {}",
                spec.display_name(),
                spec.location()
            ),
            format!("{ENGINE_HINT}\n\n{error}"),
        ),
        None => (
            format!(
                "Internal error when validating against {} schemas from {}",
                spec.display_name(),
                spec.location()
            ),
            error.to_string(),
        ),
    };
    Annotation::failure(file, LineRange::FALLBACK, title, message)
}

/// Annotation for a file whose contents could not be retrieved.
pub fn load_error_annotation(file: &FileRef, error: &impl std::fmt::Display) -> Annotation {
    Annotation::failure(
        file,
        LineRange::FALLBACK,
        format!("Error loading {}", file.path()),
        error.to_string(),
    )
}
