//! Error types

mod api;
mod auth;
mod field;
mod validation;

pub use api::*;
pub use auth::*;
pub use field::*;
pub use validation::*;

use crate::model::RecordId;

/// Top-level error returned by client and manager operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The credential store failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Local validation rejected a payload before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A record field could not be read.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The owning manager was shut down before the response arrived.
    #[error("Operation cancelled")]
    Cancelled,

    /// No record with the given identifier is held locally.
    #[error("Record {id} not found")]
    NotFound { id: RecordId },

    /// The operation is not valid in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Returns `true` if this error comes from local validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if the operation was discarded by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the HTTP status code if the backend answered with an error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            _ => None,
        }
    }
}
