//! # Candidates
//!
//! A [`Candidate`] is one changed file that matched the configuration. It
//! owns the file's identity, its schema specs and, once hydrated, its raw
//! bytes. Validation runs every spec against the bytes and localizes each
//! violation; a candidate that could not be hydrated produces exactly one
//! load-error annotation and never reaches the validator.

use kubevalidator_core::{dedup_annotations, Annotation, FileRef, SchemaSpec};
use kubevalidator_locate::LineLocalizer;
use kubevalidator_schema::{StructuralValidator, ValidationRequest};

use crate::annotate;
use crate::content::{ContentError, ContentSource};

/// Hydration state of a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Contents {
    NotLoaded,
    Loaded(Vec<u8>),
    Failed(ContentError),
}

/// A file selected for validation.
#[derive(Debug, Clone)]
pub struct Candidate {
    file: FileRef,
    change_ref: String,
    schemas: Vec<SchemaSpec>,
    contents: Contents,
}

impl Candidate {
    /// A candidate for `file` at `change_ref`. An empty schema list means
    /// the default spec (latest upstream Kubernetes schemas).
    pub fn new(file: FileRef, change_ref: impl Into<String>, schemas: Vec<SchemaSpec>) -> Self {
        let schemas = if schemas.is_empty() {
            vec![SchemaSpec::default()]
        } else {
            schemas
        };
        Self {
            file,
            change_ref: change_ref.into(),
            schemas,
            contents: Contents::NotLoaded,
        }
    }

    /// A candidate whose bytes are already known.
    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.contents = Contents::Loaded(bytes);
        self
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn path(&self) -> &str {
        self.file.path()
    }

    pub fn schemas(&self) -> &[SchemaSpec] {
        &self.schemas
    }

    /// Raw bytes, once hydrated.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Loaded(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The retrieval failure, if hydration failed.
    pub fn load_error(&self) -> Option<&ContentError> {
        match &self.contents {
            Contents::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Load the bytes from `source`. Only the first call fetches. A failure
    /// of either kind is kept on the candidate and surfaces as its single
    /// load-error annotation.
    pub fn hydrate(&mut self, source: &dyn ContentSource) {
        if let Contents::NotLoaded = self.contents {
            self.contents = match source.fetch(self.file.path(), &self.change_ref) {
                Ok(bytes) => Contents::Loaded(bytes),
                Err(e) => {
                    tracing::warn!(path = %self.file.path(), error = %e, "cannot load candidate");
                    Contents::Failed(e)
                }
            };
        }
    }

    /// Validate against every schema spec and return the sorted annotations.
    /// Specs that report the same thing at the same place yield it once.
    /// Calling this twice on the same candidate yields equal results.
    pub fn validate(&self, validator: &dyn StructuralValidator, localizer: &LineLocalizer) -> Vec<Annotation> {
        let bytes = match &self.contents {
            Contents::Loaded(bytes) => bytes,
            Contents::Failed(e) => return vec![annotate::load_error_annotation(&self.file, e)],
            Contents::NotLoaded => {
                return vec![annotate::load_error_annotation(
                    &self.file,
                    &format!("{} was never loaded", self.file.path()),
                )]
            }
        };
        // Localization works on text; invalid UTF-8 gets lossy text and the
        // validator reports the decoding failure itself.
        let source = String::from_utf8_lossy(bytes);

        let mut annotations = Vec::new();
        for spec in &self.schemas {
            let request = ValidationRequest::for_spec(self.file.path(), spec);
            match validator.validate(bytes, &request) {
                Ok(violations) => {
                    for violation in &violations {
                        let lines = localizer.locate_violation(&source, spec.line_numbers(), violation);
                        annotations.push(annotate::violation_annotation(&self.file, spec, violation, lines));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.file.path(),
                        schema = spec.display_name(),
                        error = %e,
                        "validator could not evaluate file"
                    );
                    annotations.push(annotate::engine_error_annotation(&self.file, spec, &e));
                }
            }
        }
        dedup_annotations(&mut annotations);
        annotations
    }

    /// Markdown list item for report summaries.
    pub fn markdown_list_item(&self) -> String {
        self.file.markdown_list_item()
    }
}
