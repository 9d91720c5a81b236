//! # Error Types
//!
//! Errors raised while constructing core values. Pipeline failures
//! (content loading, schema evaluation, localization) are never raised
//! through these types: they are converted into annotations by the unit
//! that encountered them.

use thiserror::Error;

/// Error constructing a core value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A file reference was built with an empty path.
    #[error("file path must not be empty")]
    EmptyPath,

    /// A logical path could not be parsed.
    #[error("invalid logical path: {0}")]
    Path(#[from] PathParseError),

    /// A timestamp string was not valid RFC 3339.
    #[error("invalid timestamp {input:?}: {reason}")]
    Timestamp {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },
}

/// Error parsing a violation path in one of the supported conventions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Two separators with nothing between them (`spec..replicas`).
    #[error("empty segment at offset {offset} in {path:?}")]
    EmptySegment {
        /// The raw path.
        path: String,
        /// Byte offset of the empty segment.
        offset: usize,
    },

    /// A `[` without its closing `]`.
    #[error("unclosed bracket in {0:?}")]
    UnclosedBracket(String),

    /// A JSON pointer that does not start with `/`.
    #[error("pointer {0:?} must be empty or start with '/'")]
    MissingLeadingSlash(String),

    /// A `~` not followed by `0` or `1` in a JSON pointer.
    #[error("invalid escape sequence in pointer {0:?}")]
    InvalidEscape(String),
}
