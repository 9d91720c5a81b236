//! # YAML Patch Engine
//!
//! Applies one structural edit to one document of a (possibly multi-document)
//! YAML stream and re-serializes the whole stream.
//!
//! The edit goes through `serde_yaml`'s value tree, whose mappings keep
//! insertion order, so untouched keys come back in their original order.
//! Formatting is not preserved (comments are dropped, indentation and
//! quoting are normalized); the line differ compensates for that.

use kubevalidator_core::{JsonPointer, PathConvention, PathParseError};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

/// A single structural edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Replace the node at the pointer with a value.
    Replace(Value),
    /// Remove the node at the pointer from its parent.
    Remove,
}

/// Error applying a patch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid pointer: {0}")]
    InvalidPointer(#[from] PathParseError),

    #[error("cannot parse YAML: {0}")]
    Parse(String),

    #[error("document {document} does not exist ({count} documents)")]
    DocumentOutOfRange { document: usize, count: usize },

    #[error("path {pointer:?} not found")]
    PathNotFound { pointer: String },

    #[error("cannot remove the document root")]
    RemoveRoot,

    #[error("cannot serialize patched YAML: {0}")]
    Serialize(String),
}

/// Parse every document of a YAML stream, empty documents included.
pub fn parse_documents(source: &str) -> Result<Vec<Value>, PatchError> {
    serde_yaml::Deserializer::from_str(source)
        .map(|document| Value::deserialize(document).map_err(|e| PatchError::Parse(e.to_string())))
        .collect()
}

/// Apply `op` at `pointer` (RFC 6901) inside document `document` of
/// `source`, returning the re-serialized stream.
pub fn apply(source: &str, document: usize, pointer: &str, op: &PatchOp) -> Result<String, PatchError> {
    let path = JsonPointer.parse(pointer)?;
    let mut documents = parse_documents(source)?;
    let count = documents.len();
    let target = documents
        .get_mut(document)
        .ok_or(PatchError::DocumentOutOfRange { document, count })?;

    match op {
        PatchOp::Replace(value) => {
            *resolve_mut(target, path.segments(), pointer)? = value.clone();
        }
        PatchOp::Remove => {
            let (last, parents) = path.segments().split_last().ok_or(PatchError::RemoveRoot)?;
            let parent = resolve_mut(target, parents, pointer)?;
            remove_child(parent, last, pointer)?;
        }
    }

    render(source, &documents)
}

fn not_found(pointer: &str) -> PatchError {
    PatchError::PathNotFound {
        pointer: pointer.to_string(),
    }
}

/// Mapping keys are matched by their scalar text, so `/ports/80` finds an
/// integer key `80` as well as the string `"80"`.
fn key_matches(key: &Value, segment: &str) -> bool {
    match key {
        Value::String(s) => s == segment,
        Value::Number(n) => n.to_string() == segment,
        Value::Bool(b) => b.to_string() == segment,
        Value::Null => segment == "null",
        _ => false,
    }
}

fn child_mut<'v>(node: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match node {
        Value::Mapping(map) => map
            .iter_mut()
            .find(|(key, _)| key_matches(key, segment))
            .map(|(_, value)| value),
        Value::Sequence(seq) => segment.parse::<usize>().ok().and_then(|i| seq.get_mut(i)),
        Value::Tagged(tagged) => child_mut(&mut tagged.value, segment),
        _ => None,
    }
}

fn resolve_mut<'v>(
    mut node: &'v mut Value,
    segments: &[String],
    pointer: &str,
) -> Result<&'v mut Value, PatchError> {
    for segment in segments {
        node = child_mut(node, segment).ok_or_else(|| not_found(pointer))?;
    }
    Ok(node)
}

fn remove_child(parent: &mut Value, segment: &str, pointer: &str) -> Result<(), PatchError> {
    let removed = match parent {
        Value::Mapping(map) => {
            let key = map.keys().find(|key| key_matches(key, segment)).cloned();
            key.and_then(|key| map.shift_remove(&key))
        }
        Value::Sequence(seq) => match segment.parse::<usize>() {
            Ok(i) if i < seq.len() => Some(seq.remove(i)),
            _ => None,
        },
        Value::Tagged(tagged) => return remove_child(&mut tagged.value, segment, pointer),
        _ => None,
    };
    removed.map(|_| ()).ok_or_else(|| not_found(pointer))
}

/// True when the first meaningful line of `source` is a document marker.
fn starts_with_marker(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| line.starts_with("---"))
}

fn render(source: &str, documents: &[Value]) -> Result<String, PatchError> {
    let mut out = String::new();
    if starts_with_marker(source) {
        out.push_str("---\n");
    }
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        if document.is_null() {
            continue;
        }
        let text = serde_yaml::to_string(document).map_err(|e| PatchError::Serialize(e.to_string()))?;
        out.push_str(&text);
    }
    Ok(out)
}
