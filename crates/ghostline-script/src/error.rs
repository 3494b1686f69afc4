//! Error types for ghostline-script

use thiserror::Error;

/// Script loading and replay error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid script: {0}")]
    InvalidScript(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Simulation error: {0}")]
    Core(#[from] ghostline_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
