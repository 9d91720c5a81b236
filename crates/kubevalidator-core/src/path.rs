//! # Logical Paths
//!
//! A [`LogicalPath`] addresses a node in a document's parsed structure,
//! independent of how the source text is formatted. Structural validators
//! disagree on how to spell such a path:
//!
//! - dotted, with a synthetic root: `(root).spec.containers.0.image`
//! - dotted with bracketed indices: `spec.containers[0].image`
//! - RFC 6901 pointer: `/spec/containers/0/image`
//!
//! Each spelling has a [`PathConvention`] that parses it into the same
//! segment list. Segments are kept as strings; whether `0` is a sequence
//! index or a mapping key is decided by the node it is applied to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathParseError;

/// Root marker emitted by dotted-path validators.
const ROOT_MARKER: &str = "(root)";

/// An ordered list of mapping keys and sequence indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// The path addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from raw (unescaped) segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The unescaped segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// A new path one level deeper.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// RFC 6901 pointer: `""` for the root, `/a/b~1c` otherwise.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.segments {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        }
        pointer
    }

    /// The dotted form prefixed with the synthetic root, `(root).spec.replicas`.
    pub fn to_context(&self) -> String {
        if self.is_root() {
            ROOT_MARKER.to_string()
        } else {
            format!("{ROOT_MARKER}.{self}")
        }
    }
}

impl fmt::Display for LogicalPath {
    /// Dotted form with bracketed indices: `spec.containers[0].image`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(ROOT_MARKER);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if is_index(segment) {
                write!(f, "[{segment}]")?;
            } else {
                if i > 0 {
                    f.write_str(".")?;
                }
                f.write_str(segment)?;
            }
        }
        Ok(())
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// A spelling of logical paths used by some structural validator.
pub trait PathConvention {
    /// Parse a raw path into segments.
    fn parse(&self, raw: &str) -> Result<LogicalPath, PathParseError>;
}

/// Dotted paths, with or without the `(root)` prefix, indices either dotted
/// (`containers.0`) or bracketed (`containers[0]`, `annotations['a.b/c']`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedPath;

impl PathConvention for DottedPath {
    fn parse(&self, raw: &str) -> Result<LogicalPath, PathParseError> {
        let body = raw.strip_prefix(ROOT_MARKER).unwrap_or(raw);
        let body = body.strip_prefix('.').unwrap_or(body);
        let offset_base = raw.len() - body.len();

        let mut segments = Vec::new();
        let mut current = String::new();
        // Set right after a `]` so `a[0].b` does not see an empty segment.
        let mut after_bracket = false;
        let mut chars = body.char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() && !after_bracket {
                        return Err(PathParseError::EmptySegment {
                            path: raw.to_string(),
                            offset: offset_base + offset,
                        });
                    }
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(PathParseError::UnclosedBracket(raw.to_string()));
                    }
                    let unquoted = inner
                        .strip_prefix('\'')
                        .and_then(|s| s.strip_suffix('\''))
                        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
                        .unwrap_or(inner.as_str());
                    segments.push(unquoted.to_string());
                    after_bracket = true;
                }
                _ => {
                    current.push(c);
                    after_bracket = false;
                }
            }
        }

        if !current.is_empty() {
            segments.push(current);
        } else if !body.is_empty() && !after_bracket {
            return Err(PathParseError::EmptySegment {
                path: raw.to_string(),
                offset: raw.len(),
            });
        }

        Ok(LogicalPath { segments })
    }
}

/// RFC 6901 JSON pointers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointer;

impl PathConvention for JsonPointer {
    fn parse(&self, raw: &str) -> Result<LogicalPath, PathParseError> {
        if raw.is_empty() {
            return Ok(LogicalPath::root());
        }
        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| PathParseError::MissingLeadingSlash(raw.to_string()))?;

        let segments = body
            .split('/')
            .map(|token| unescape_token(token).ok_or_else(|| PathParseError::InvalidEscape(raw.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LogicalPath { segments })
    }
}

fn unescape_token(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Parse a path in whichever convention its spelling indicates: pointers
/// start with `/` (or are empty), everything else is dotted.
pub fn parse_path(raw: &str) -> Result<LogicalPath, PathParseError> {
    if raw.is_empty() || raw.starts_with('/') {
        JsonPointer.parse(raw)
    } else {
        DottedPath.parse(raw)
    }
}
