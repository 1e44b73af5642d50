//! # kyc-schema — Form Validation for the Onboarding Engine
//!
//! Validates onboarding form values against JSON Schema (Draft 2020-12)
//! step schemas, reshaped per client context by the schema filter.
//!
//! ## Modules
//!
//! - [`form`]: compiled [`FormSchema`] with `safe_parse`.
//! - [`filter`]: [`filter_schema`], the context-aware rewrite of hidden
//!   fields and array bounds.
//! - [`refine`]: cross-field refinements run after the base schema.
//! - [`validate`]: structured [`Violation`]s and their classification.
//! - [`i18n`]: message keys and the [`Translate`] seam.
//! - [`registry`]: the named step schemas.
//! - [`dynamic`]: document request and question schemas built from
//!   server data.
//!
//! ## Crate Policy
//!
//! - A failed validation is data ([`SchemaError::ValidationFailed`]), not
//!   a panic, and always lists every violation found.
//! - Filtering never mutates its input; each call compiles a fresh schema.

pub mod dynamic;
pub mod error;
pub mod filter;
pub mod form;
pub mod i18n;
pub mod refine;
pub mod registry;
pub mod validate;

pub use dynamic::{
    active_requirement, document_request_schema, question_field, question_schema,
    requirement_fields, requirement_progress, RequirementProgress, SubQuestionGate,
};
pub use error::SchemaError;
pub use filter::filter_schema;
pub use form::FormSchema;
pub use i18n::{localize, message_keys, MessageCatalog, Translate};
pub use refine::{BuiltinRefinement, Condition, Refinement};
pub use registry::SchemaRegistry;
pub use validate::{ValidationViolations, Violation, ViolationKind};
