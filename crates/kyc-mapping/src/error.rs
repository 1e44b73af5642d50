//! Errors raised while mapping values between form and API shapes.

use thiserror::Error;

use kyc_core::{ConfigError, PathError};

/// Error during value mapping.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A request body could not be built because a write collided with an
    /// existing value of the wrong shape.
    #[error("cannot write field '{field}': {source}")]
    Write {
        /// Form field being written.
        field: String,
        /// The underlying path error.
        #[source]
        source: PathError,
    },

    /// A form value names a field the registry does not know.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API object could not be converted to a JSON tree.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
