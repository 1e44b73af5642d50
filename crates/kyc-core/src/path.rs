//! # Typed Field Paths
//!
//! A [`FieldPath`] is a parsed sequence of [`PathSegment`]s addressing a
//! value inside a nested JSON document: `organizationDetails.addresses.0.city`,
//! `parties[1].individualDetails.individualIds[0].value`, or the server's
//! pointer-like `$.parties.0.email`.
//!
//! ## Grammar
//!
//! ```text
//! path     := ["$" ["."]] part ("." part)*
//! part     := (key | "[" key "]")+
//! key      := any run of characters other than "." "[" "]"
//! ```
//!
//! A segment whose key is all ASCII digits is an *index* segment. Reads treat
//! an index segment as an array position (or as a plain key on an object);
//! writes create an array when the following segment is an index and an
//! object otherwise.
//!
//! ## Design
//!
//! The value mapper (read and write) and the server-error translator all
//! go through this one parser, so the two mapping directions cannot drift
//! apart and error paths compare segment-by-segment rather than by string
//! prefix (`organizationName` never matches `organizationNameSuffix`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PathError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// The raw key text (`"city"`, `"0"`).
    pub key: String,
    /// Whether the key is a non-negative integer index.
    pub is_index: bool,
}

impl PathSegment {
    /// An object key segment.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        let is_index = is_index_key(&key);
        Self { key, is_index }
    }

    /// An array index segment.
    pub fn index(index: usize) -> Self {
        Self {
            key: index.to_string(),
            is_index: true,
        }
    }

    /// The numeric index, if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        if self.is_index {
            self.key.parse().ok()
        } else {
            None
        }
    }
}

fn is_index_key(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// A parsed, validated path into a nested JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the root value itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot/bracket path, accepting an optional `$` / `$.` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] for empty paths, empty segments and
    /// unterminated brackets.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let body = raw
            .strip_prefix("$.")
            .or_else(|| raw.strip_prefix('$'))
            .unwrap_or(raw);
        if body.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for (position, part) in body.split('.').enumerate() {
            if part.is_empty() {
                return Err(PathError::EmptySegment {
                    path: raw.to_string(),
                    position,
                });
            }
            parse_part(part, raw, position, &mut segments)?;
        }
        Ok(Self { segments })
    }

    /// Build a path from already-typed segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `key` appended.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::key(key));
        next
    }

    /// A new path with an index segment appended.
    pub fn at(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::index(index));
        next
    }

    /// A new path with all of `other`'s segments appended.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut next = self.clone();
        next.segments.extend(other.segments.iter().cloned());
        next
    }

    /// Segment-wise prefix test.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// The remainder after `prefix`, if `prefix` is a segment-wise prefix.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        if self.starts_with(prefix) {
            Some(Self {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Resolve this path inside `root`.
    ///
    /// Returns `None` when any segment is missing or walks into a scalar.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(&segment.key)?,
                Value::Array(items) => items.get(segment.as_index()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at this path inside `root`, creating intermediate
    /// objects or arrays as dictated by the next segment.
    ///
    /// Arrays are padded with `null` up to the written index.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::ContainerConflict`] if an existing non-null
    /// scalar sits where a container is required, or an object key is
    /// written into an array.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        let mut current = root;
        for (position, segment) in self.segments.iter().enumerate() {
            let slot = self.slot(current, segment)?;
            match self.segments.get(position + 1) {
                Some(next) => {
                    if slot.is_null() {
                        *slot = empty_container(next.is_index);
                    }
                    current = slot;
                }
                None => {
                    *slot = value;
                    return Ok(());
                }
            }
        }
        *current = value;
        Ok(())
    }

    fn slot<'v>(
        &self,
        container: &'v mut Value,
        segment: &PathSegment,
    ) -> Result<&'v mut Value, PathError> {
        if container.is_null() {
            *container = empty_container(segment.is_index);
        }
        match container {
            Value::Object(map) => Ok(map.entry(segment.key.clone()).or_insert(Value::Null)),
            Value::Array(items) => {
                let index = segment
                    .as_index()
                    .ok_or_else(|| self.conflict(segment, "an array"))?;
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                Ok(&mut items[index])
            }
            other => Err(self.conflict(segment, json_kind(other))),
        }
    }

    fn conflict(&self, segment: &PathSegment, found: &'static str) -> PathError {
        PathError::ContainerConflict {
            path: self.to_string(),
            segment: segment.key.clone(),
            found,
        }
    }
}

fn parse_part(
    part: &str,
    raw: &str,
    position: usize,
    out: &mut Vec<PathSegment>,
) -> Result<(), PathError> {
    let mut rest = part;
    while !rest.is_empty() {
        if let Some(after_open) = rest.strip_prefix('[') {
            let close = after_open
                .find(']')
                .ok_or_else(|| PathError::UnterminatedBracket {
                    path: raw.to_string(),
                })?;
            let inner = &after_open[..close];
            if inner.is_empty() {
                return Err(PathError::EmptySegment {
                    path: raw.to_string(),
                    position,
                });
            }
            out.push(PathSegment::key(inner));
            rest = &after_open[close + 1..];
        } else {
            let end = rest.find('[').unwrap_or(rest.len());
            out.push(PathSegment::key(&rest[..end]));
            rest = &rest[end..];
        }
    }
    Ok(())
}

fn empty_container(index: bool) -> Value {
    if index {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.key)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}
