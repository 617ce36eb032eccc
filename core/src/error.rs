//! Error types for Synod

use thiserror::Error;

/// Main error type for Synod
#[derive(Error, Debug)]
pub enum SynodError {
    // ============ Consensus Errors ============
    #[error("Consensus not reached")]
    ConsensusNotReached,

    #[error("Proposal rounds exhausted")]
    RoundsExhausted,

    #[error("Protocol invariant violated: {0}")]
    InvariantViolation(String),

    // ============ Request Errors ============
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ============ Serialization Errors ============
    #[error("Message serialization failed: {0}")]
    SerializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for SynodError {
    fn from(err: serde_json::Error) -> Self {
        SynodError::SerializationError(err.to_string())
    }
}
