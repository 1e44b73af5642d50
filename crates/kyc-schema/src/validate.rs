//! # Violations
//!
//! Structured validation failures shared by JSON Schema validation and the
//! cross-field refinements.
//!
//! ## Design
//!
//! Every violation names the dotted form field it belongs to (for example
//! `controllerIds.0.value`) and a [`ViolationKind`] that selects its message
//! key. The English `message` is kept for logs; users see the localized text
//! produced by [`crate::i18n::localize`].
//!
//! An array below its `minItems` bound while empty, a string below
//! `minLength` while empty, and an empty string rejected by `pattern` or
//! `enum` are all reported as [`ViolationKind::Required`]: from the user's
//! point of view the field was simply left blank.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde::Serialize;
use serde_json::Value;

/// What went wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationKind {
    /// Missing or blank.
    Required,
    /// Fewer array items than `limit`.
    TooFew { limit: u64 },
    /// More array items than `limit`.
    TooMany { limit: u64 },
    /// Shorter than `limit` characters.
    TooShort { limit: u64 },
    /// Longer than `limit` characters.
    TooLong { limit: u64 },
    /// Does not match the field's pattern.
    Pattern,
    /// Does not match the declared format.
    Format,
    /// Not one of the allowed values.
    Enum,
    /// Wrong JSON type.
    Type,
    /// A refinement failed; `code` selects the message.
    Custom { code: String },
    /// Anything the classifier has no specific message for.
    Other,
}

impl ViolationKind {
    /// Last segment of the message key for this kind.
    pub fn message_key(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::TooFew { .. } => "minItems",
            Self::TooMany { .. } => "maxItems",
            Self::TooShort { .. } => "minLength",
            Self::TooLong { .. } => "maxLength",
            Self::Pattern => "pattern",
            Self::Format => "format",
            Self::Enum => "enum",
            Self::Type => "type",
            Self::Custom { code } => code,
            Self::Other => "invalid",
        }
    }

    /// The bound interpolated as `{count}` into the message.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::TooFew { limit }
            | Self::TooMany { limit }
            | Self::TooShort { limit }
            | Self::TooLong { limit } => Some(*limit),
            _ => None,
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error, or the
    /// refinement name for cross-field checks.
    pub schema_path: String,
    /// Dotted form field path.
    pub field: String,
    /// Classification used for message lookup.
    pub kind: ViolationKind,
    /// Human-readable English description.
    pub message: String,
}

impl Violation {
    /// Violation raised by a refinement against `field`.
    pub fn refinement(
        refinement: &str,
        field: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            instance_path: field_to_pointer(&field),
            schema_path: format!("#/x-refinements/{refinement}"),
            field,
            kind,
            message: message.into(),
        }
    }

    /// Build a violation from a `jsonschema` error.
    pub fn from_error(error: &ValidationError<'_>) -> Self {
        let instance_path = error.instance_path.to_string();
        let mut field = pointer_to_field(&instance_path);
        if let ValidationErrorKind::Required { property } = &error.kind {
            if let Some(name) = property.as_str() {
                field = if field.is_empty() {
                    name.to_string()
                } else {
                    format!("{field}.{name}")
                };
            }
        }
        Self {
            instance_path,
            schema_path: error.schema_path.to_string(),
            field,
            kind: classify(&error.kind, &error.instance),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.field, self.message)
        }
    }
}

fn classify(kind: &ValidationErrorKind, instance: &Value) -> ViolationKind {
    let blank = matches!(instance, Value::String(s) if s.is_empty());
    match kind {
        ValidationErrorKind::Required { .. } => ViolationKind::Required,
        ValidationErrorKind::MinItems { limit } => {
            if instance.as_array().is_some_and(|a| a.is_empty()) {
                ViolationKind::Required
            } else {
                ViolationKind::TooFew { limit: *limit }
            }
        }
        ValidationErrorKind::MaxItems { limit } => ViolationKind::TooMany { limit: *limit },
        ValidationErrorKind::MinLength { limit } => {
            if blank {
                ViolationKind::Required
            } else {
                ViolationKind::TooShort { limit: *limit }
            }
        }
        ValidationErrorKind::MaxLength { limit } => ViolationKind::TooLong { limit: *limit },
        ValidationErrorKind::Pattern { .. } | ValidationErrorKind::Enum { .. } if blank => {
            ViolationKind::Required
        }
        ValidationErrorKind::Pattern { .. } => ViolationKind::Pattern,
        ValidationErrorKind::Format { .. } => ViolationKind::Format,
        ValidationErrorKind::Enum { .. } => ViolationKind::Enum,
        ValidationErrorKind::Type { .. } => ViolationKind::Type,
        _ => ViolationKind::Other,
    }
}

/// Run `validator` over `instance` and collect structured violations.
pub fn collect_violations(validator: &Validator, instance: &Value) -> Vec<Violation> {
    validator
        .iter_errors(instance)
        .map(|e| Violation::from_error(&e))
        .collect()
}

/// `/controllerIds/0/value` → `controllerIds.0.value`.
pub fn pointer_to_field(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

/// `controllerIds.0.value` → `/controllerIds/0/value`.
pub fn field_to_pointer(field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    field
        .split('.')
        .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations reported against `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.field == field)
    }

    /// Whether any violation names `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
