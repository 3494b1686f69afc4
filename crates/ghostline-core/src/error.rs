//! Error types for ghostline-core

use crate::{CommandId, EntityId};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Command not found: {0}")]
    CommandNotFound(CommandId),

    #[error("Path sample at {time} does not follow last sample at {last}")]
    NonMonotonicSample { last: f64, time: f64 },

    #[error("No rewind charges left")]
    NoRewindCharges,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The cursor or branch protocol reached an inconsistent state
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant(message.into())
    }

    /// Check if this error means the simulation can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
