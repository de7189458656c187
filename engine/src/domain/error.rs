//! Domain-level errors
//! These represent rule violations and lifecycle failures surfaced to callers

use crate::domain::value_objects::Role;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DomainError {
    // Configuration errors (detected before anything is spawned, never retried)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    // Collaborator errors
    #[error("Executable for {role} not found: {reason}")]
    ExecutableNotFound { role: Role, reason: String },

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    // Lifecycle errors
    #[error("Could not start {role}: {reason}\n{output}")]
    StartFailure {
        role: Role,
        reason: String,
        output: String,
    },

    #[error("Process is not running")]
    NotRunning,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Failed to signal process: {0}")]
    SignalFailed(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    /// Captured process output attached to a start failure, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            DomainError::StartFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
