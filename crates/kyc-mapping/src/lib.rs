//! # kyc-mapping — Value Mapping and Server-Error Translation
//!
//! The two directions between a form and the client API, both driven by
//! the field registry's paths and transforms:
//!
//! - [`ValueMapper`] reads a party's values out of a client response and
//!   writes form values into `parties` / `addParties` request bodies.
//! - [`ErrorTranslator`] maps the server's JSON-path validation errors
//!   back onto form field names, reporting anything it cannot place.
//!
//! Both are pure functions of the registry and their inputs.

pub mod error;
pub mod hooks;
pub mod mapper;
pub mod translate;

pub use error::MappingError;
pub use hooks::PreSubmitHook;
pub use mapper::{ArrayKey, ValueMapper};
pub use translate::{ErrorTranslator, FormError, TranslationReport, SERVER_ERROR_PREFIX};
