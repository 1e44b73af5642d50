//! # Schema Errors
//!
//! Failures of form validation and of building form schemas. A failed
//! validation is an ordinary outcome, so [`SchemaError::ValidationFailed`]
//! carries the full structured violation list for the presentation layer.

use thiserror::Error;

use kyc_core::ConfigError;

use crate::validate::ValidationViolations;

/// Error during schema loading, filtering or validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The form values did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema could not be found or parsed.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema name or file.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema name.
        schema_name: String,
        /// Reason reported by the validator compiler.
        reason: String,
    },

    /// The schema is valid JSON Schema but not shaped like a form: it has
    /// no `properties` object, an array field is not typed as an array, or
    /// its `x-refinements` keyword is malformed.
    #[error("schema '{schema_name}' is not a usable form schema: {reason}")]
    InvalidFormSchema {
        /// Schema name.
        schema_name: String,
        /// What is wrong with its shape.
        reason: String,
    },

    /// A field named by the schema is not usable with the field registry.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error reading a schema or catalog file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// The violations of a failed validation, if this is one.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}
