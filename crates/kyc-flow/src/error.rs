//! # Flow Errors
//!
//! Errors raised while replaying step validity or moving through a
//! section stepper. Navigation to an unknown screen is deliberately not an
//! error: it resolves to [`Screen::Unknown`](crate::Screen::Unknown).

use thiserror::Error;

use kyc_core::ConfigError;
use kyc_mapping::MappingError;
use kyc_schema::SchemaError;

#[derive(Error, Debug)]
pub enum FlowError {
    /// A step or schema names a field the registry does not know.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A step schema could not be found, compiled or filtered.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Party data could not be mapped to form values.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A stepper was opened on a screen that has no steps.
    #[error("screen '{screen_id}' is not a stepper screen")]
    NotAStepper {
        /// The current screen.
        screen_id: String,
    },

    /// A step id that the stepper does not contain.
    #[error("step '{step_id}' does not exist on screen '{screen_id}'")]
    UnknownStep {
        /// The stepper's screen.
        screen_id: String,
        /// The requested step.
        step_id: String,
    },

    /// The flow configuration declares the same screen id twice.
    #[error("screen '{screen_id}' is declared more than once")]
    DuplicateScreen {
        /// The duplicated screen id.
        screen_id: String,
    },
}
