//! Error taxonomy for the propagation core.
//!
//! Every fallible core operation returns [`EchoError`]. Store adapters map
//! their native failures into [`EchoError::Persistence`]; nothing in the core
//! turns an error into a fallback value.

use bleed_types::{EchoId, EchoStatus, ParseEnumError};
use uuid::Uuid;

/// Errors surfaced by the propagation core.
#[derive(Debug, thiserror::Error)]
pub enum EchoError {
    /// A referenced event, world, echo, or connection does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The missing identifier.
        id: Uuid,
    },

    /// A lifecycle transition was attempted from the wrong state.
    #[error("echo {id} is {current}; cannot move to {attempted}")]
    InvalidStateTransition {
        /// The echo.
        id: EchoId,
        /// Status observed in the store.
        current: EchoStatus,
        /// Status the caller asked for.
        attempted: EchoStatus,
    },

    /// Malformed input: vector tag, strength, impact, or a settings value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The underlying store rejected a read or write.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl EchoError {
    /// Shorthand for [`EchoError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable machine-readable kind, used in API error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::Validation(_) => "validation_failure",
            Self::Persistence(_) => "persistence_failure",
        }
    }
}

impl From<ParseEnumError> for EchoError {
    fn from(err: ParseEnumError) -> Self {
        Self::Validation(err.to_string())
    }
}
