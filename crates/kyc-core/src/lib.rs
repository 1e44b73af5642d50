//! # kyc-core — Foundational Types for the Onboarding Engine
//!
//! Defines the data model shared by every other crate in the workspace:
//! the client and party shapes returned by the client-management API, the
//! identifier newtypes, the derived [`ClientContext`], and the typed
//! [`FieldPath`] used by both directions of value mapping and by server
//! error translation.
//!
//! ## Key Design Principles
//!
//! 1. **API shapes are tolerant.** Response types use `#[serde(default)]`
//!    and keep unknown keys in a flattened `extra` map so that a newer
//!    backend never breaks deserialization and nothing is lost on the way
//!    back out.
//!
//! 2. **One path grammar.** Dot paths, bracket indices and the `$.`
//!    pointer prefix are parsed once into [`PathSegment`]s. Reads and writes
//!    walk the same segments, so a value written at a path is read back from
//!    the same place.
//!
//! 3. **Context is derived, never stored.** [`ClientContext::resolve`] is a
//!    pure function of the latest fetched client.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kyc-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod client;
pub mod context;
pub mod documents;
pub mod error;
pub mod identity;
pub mod path;

pub use client::{
    ApiErrorBody, ApiErrorReason, ClientResponse, ClientStatus, OrganizationDetails, Outstanding,
    PartyFilter, PartyResponse, PartyRole, PartyType, QuestionAnswer,
};
pub use context::ClientContext;
pub use documents::{
    DocumentRequestResponse, DocumentRequirement, Question, QuestionList, ResponseItems,
    ResponseSchema, SubQuestion,
};
pub use error::{ConfigError, KycError, PathError};
pub use identity::{ClientId, DocumentRequestId, PartyId, QuestionId};
pub use path::{FieldPath, PathSegment};

/// Flat form values keyed by registry field name.
///
/// Values may themselves be nested (an address object, a list of
/// identity documents); only the top level is keyed by field name.
pub type FormValues = serde_json::Map<String, serde_json::Value>;
