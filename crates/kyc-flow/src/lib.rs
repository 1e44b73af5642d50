//! # kyc-flow — Wizard Navigation and Section Progress
//!
//! The screen-level orchestration of the onboarding wizard:
//!
//! - [`FlowConfig`] declares the screens, which of them are sections on
//!   the overview, and the steps of each section stepper.
//! - [`Navigator`] keeps the screen history and the per-screen side
//!   channels (`editing_party_id`, `previously_completed`).
//! - [`SectionStepper`] moves through one stepper's steps and decides
//!   where "Continue" and "Back" lead.
//! - [`StepValidator`] replays each step's filtered schema against the
//!   latest party data, and [`FlowProgress`] turns those replays into the
//!   status of every section.
//!
//! ## Invariants
//!
//! - The navigation history is never empty; its first entry is the origin.
//! - Section statuses are derived from client data and the session only.
//!   Nothing here performs I/O.

pub mod config;
pub mod default_flow;
pub mod error;
pub mod navigation;
pub mod progress;
pub mod session;
pub mod status;
pub mod stepper;
pub mod validity;

// ─── Configuration re-exports ────────────────────────────────────────

pub use config::{
    FlowConfig, Landmarks, PartyTemplate, Screen, ScreenConfig, SectionConfig, StepConfig,
    StepType, StepperConfig,
};
pub use default_flow::default_flow;

// ─── Navigation re-exports ───────────────────────────────────────────

pub use navigation::{GoToConfig, Navigator};
pub use stepper::{SectionStepper, Transition};

// ─── Session re-exports ──────────────────────────────────────────────

pub use session::{FlowSessionData, FlowSessionUpdate, FormSessionStore};

// ─── Progress re-exports ─────────────────────────────────────────────

pub use progress::{FlowProgress, SectionProgress};
pub use status::{SectionStatus, StatusInputs, StatusStrategy};
pub use validity::{StepValidation, StepValidator, StepperValidation};

// ─── Error re-exports ────────────────────────────────────────────────

pub use error::FlowError;
