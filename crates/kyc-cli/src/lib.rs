//! # kyc-cli — Onboarding Engine Command-Line Interface
//!
//! Offline inspection of the onboarding engine against JSON fixtures.
//!
//! ## Subcommands
//!
//! - `rules` — effective field rules for a product/jurisdiction/entity type
//! - `map` — form values of one party of a client response
//! - `status` — section statuses and invalid steps of the default flow
//! - `translate` — server validation errors attached to form fields
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the library crates and return an exit code:
//!   `0` on success, `1` when the input is well-formed but fails (for
//!   example, unhandled server errors).

pub mod fixture;
pub mod map;
pub mod rules;
pub mod status;
pub mod translate;
