//! # kyc-fields — Field Configuration Registry and Rule Evaluation
//!
//! Decides, per field and per [`ClientContext`](kyc_core::ClientContext),
//! whether a form field is visible, hidden, disabled or read-only, whether
//! it is required, what it defaults to, and (for repeatable fields) how
//! many entries it takes.
//!
//! ## Layers
//!
//! - [`rule`]: rule patches, conditions and the last-match-wins fold.
//! - [`registry`]: the YAML-declared [`FieldRegistry`].
//! - [`evaluate`]: effective rules and context-aware form defaults.
//! - [`transform`]: bidirectional value transforms between API and form
//!   representations, and error-path rewrites.
//! - [`phone`]: E.164 splitting used by the phone transform.
//!
//! ## Crate Policy
//!
//! - Everything here is a pure function of its inputs. Nothing caches
//!   evaluated rules, so concurrent callers never need synchronization.
//! - Registry misuse (unknown name, array rule on a scalar field) is a
//!   [`ConfigError`](kyc_core::ConfigError), never a silent default.

pub mod evaluate;
pub mod phone;
pub mod registry;
pub mod rule;
pub mod transform;

pub use evaluate::{default_form_values, evaluate_rule};
pub use registry::{FieldConfig, FieldKind, FieldRegistry, SubFieldConfig};
pub use rule::{
    fold_rules, ArrayFieldRule, ConditionalRule, EffectiveRule, FieldRule, RuleCondition,
    RulePatch, Visibility,
};
pub use transform::{ErrorRewrite, ValueTransform, ADDRESS_LINE_KEYS};
