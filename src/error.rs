//! Kernel error types

use thiserror::Error;

use crate::scene::ObjectId;

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors surfaced to callers of the kernel.
///
/// Numerical trouble (SGP4 decay, universal-variable non-convergence, a
/// Lagrange window running out) never shows up here: those are absorbed by
/// the component that hit them and logged.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Handle does not refer to a live object
    #[error("unknown object handle {0}")]
    UnknownObject(ObjectId),

    /// Root object without a declared reference frame
    #[error("object '{0}' has no reference frame and no ancestor declares one")]
    UnresolvedFrame(String),

    /// Operation needs a different kind of object
    #[error("object '{name}' is not a {expected}")]
    WrongKind { name: String, expected: &'static str },

    /// Gimbal asked to track one of its own descendants
    #[error("gimbal '{gimbal}' cannot track its descendant '{target}'")]
    DescendantTrackTarget { gimbal: String, target: String },

    /// Two-line element set could not be parsed
    #[error("invalid TLE for '{name}': {reason}")]
    Tle { name: String, reason: String },

    /// SGP4 rejected the parsed elements
    #[error("SGP4 model error for '{name}': {reason}")]
    Sgp4Model { name: String, reason: String },

    /// Ephemeris built from zero samples
    #[error("ephemeris '{0}' has no samples")]
    EmptyEphemeris(String),

    /// Scenario event record could not be decoded
    #[error("invalid event record: {0}")]
    InvalidEventRecord(#[from] serde_json::Error),

    /// Universe configuration could not be decoded
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Event handler aborted the tick
    #[error("event handler for '{kind}' failed: {reason}")]
    Handler { kind: String, reason: String },
}

impl KernelError {
    /// Contract failures abort the tick; everything else is a bad input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            KernelError::UnknownObject(_)
                | KernelError::UnresolvedFrame(_)
                | KernelError::WrongKind { .. }
                | KernelError::DescendantTrackTarget { .. }
        )
    }
}
