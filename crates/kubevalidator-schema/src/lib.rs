//! # kubevalidator-schema: Structural Validation
//!
//! Validates Kubernetes manifests against the per-version JSON schemas
//! published by the `*-json-schema` repositories, and normalizes the
//! engine's output into [`ViolationRecord`](kubevalidator_core::ViolationRecord)s.
//!
//! ## Modules
//!
//! - [`source`]: where schema documents come from ([`SchemaSource`]):
//!   HTTP, a local mirror, or a cache in front of either.
//! - [`validate`]: the [`StructuralValidator`] seam and its `jsonschema`
//!   implementation, [`KubeSchemaValidator`].
//!
//! ## Crate Policy
//!
//! - Depends only on `kubevalidator-core` internally.
//! - Validator configuration is call-scoped ([`ValidationRequest`]); no
//!   process-wide settings.
//! - Validation failures are data, not errors. [`EngineError`] is reserved
//!   for inputs the engine could not evaluate at all.

pub mod source;
pub mod validate;

pub use source::{
    CachingSchemaSource, DirectorySchemaSource, HttpSchemaSource, SchemaFetchError, SchemaSource,
    DEFAULT_FETCH_TIMEOUT,
};
pub use validate::{
    yaml_to_json_value, EngineError, KubeSchemaValidator, StructuralValidator, ValidationRequest,
};
