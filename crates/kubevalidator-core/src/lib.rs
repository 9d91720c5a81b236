//! # kubevalidator-core: Foundational Types
//!
//! Shared data model for the validation-and-localization pipeline. Every
//! other crate in the workspace depends on `kubevalidator-core`; it depends
//! on nothing internal.
//!
//! ## Key Types
//!
//! - [`SchemaSpec`]: declarative schema reference, resolved to a schema
//!   location and display name without I/O.
//! - [`LogicalPath`]: position inside a parsed document, convertible to an
//!   RFC 6901 pointer. Validators report paths in different conventions;
//!   [`PathConvention`] normalizes them at the boundary.
//! - [`ViolationRecord`]: one failed constraint as reported by a
//!   structural validator.
//! - [`LineRange`], [`Annotation`]: a line-anchored diagnostic.
//! - [`Report`]: the verdict for one validation run.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kubevalidator-*` crates.
//! - No `.unwrap()` outside tests.
//! - Everything here is a value type: no I/O, no global state.

pub mod annotation;
pub mod error;
pub mod path;
pub mod report;
pub mod spec;
pub mod temporal;
pub mod violation;

pub use annotation::{dedup_annotations, sort_annotations, Annotation, AnnotationLevel, FileRef, LineRange};
pub use error::{CoreError, PathParseError};
pub use path::{parse_path, DottedPath, JsonPointer, LogicalPath, PathConvention};
pub use report::{Conclusion, Report, RunStatus};
pub use spec::{
    resource_schema_url, LineNumberMode, PlatformVariant, SchemaSpec, DEFAULT_SCHEMA_FORK,
    UNPINNED_VERSION,
};
pub use temporal::Timestamp;
pub use violation::{ViolationKind, ViolationRecord};
