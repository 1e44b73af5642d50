//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared across the onboarding engine. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Configuration errors are developer-facing and fatal: a form that
//!   names an unregistered field, or asks for an array rule on a scalar
//!   field, is a bug in the wizard configuration and must surface
//!   immediately rather than fall back to a default.
//! - Path errors carry the full offending path and the segment at which
//!   the walk failed.

use thiserror::Error;

/// Top-level error type for the onboarding engine.
#[derive(Error, Debug)]
pub enum KycError {
    /// Field configuration is inconsistent with its use.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A field path could not be parsed or walked.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration error raised by the field registry and its consumers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field name was looked up that has no registry entry.
    #[error("field '{field}' is not registered in the field configuration registry")]
    UnknownField {
        /// The unregistered field name.
        field: String,
    },

    /// An array rule was requested for a field not declared as an array.
    #[error("field '{field}' is not declared as an array field")]
    NotArrayField {
        /// The scalar field name.
        field: String,
    },

    /// The same field name appears twice in a registry document.
    #[error("field '{field}' is declared more than once")]
    DuplicateField {
        /// The duplicated field name.
        field: String,
    },

    /// A single field entry is internally inconsistent.
    #[error("invalid configuration for field '{field}': {reason}")]
    InvalidField {
        /// The offending field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The registry document could not be parsed at all.
    #[error("field registry could not be loaded: {reason}")]
    InvalidRegistry {
        /// Parser or IO failure description.
        reason: String,
    },
}

/// Error while parsing or walking a [`FieldPath`](crate::FieldPath).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string was empty (or only a `$` root marker).
    #[error("path is empty")]
    Empty,

    /// Two separators with nothing between them, or a trailing separator.
    #[error("path '{path}' has an empty segment at position {position}")]
    EmptySegment {
        /// The raw path.
        path: String,
        /// Zero-based segment position.
        position: usize,
    },

    /// An opening `[` without a matching `]`.
    #[error("path '{path}' has an unterminated index bracket")]
    UnterminatedBracket {
        /// The raw path.
        path: String,
    },

    /// A write needed to descend through a value that is not a container
    /// of the required kind.
    #[error("cannot write path '{path}': segment '{segment}' lands on {found}")]
    ContainerConflict {
        /// The full path being written.
        path: String,
        /// The segment at which the walk failed.
        segment: String,
        /// The JSON kind found there.
        found: &'static str,
    },
}
