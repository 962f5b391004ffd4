//! Error types for the channel crate.

use thiserror::Error;

use crate::state::QubitHandle;

/// Errors that can occur in quantum channel operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChannelError {
    /// The handle does not name a qubit in flight.
    ///
    /// Either it was never issued by this channel or it has already been
    /// measured; a qubit can only be measured once.
    #[error("Unknown qubit handle: {0}")]
    UnknownHandle(QubitHandle),

    /// Too many prepared qubits are waiting for measurement.
    #[error("Channel capacity exceeded: {pending} qubits pending, limit is {limit}")]
    CapacityExceeded {
        /// Qubits currently in flight.
        pending: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Handles and bases passed to a batch measurement differ in length.
    #[error("Batch length mismatch: {handles} handles but {bases} bases")]
    BatchMismatch {
        /// Number of handles supplied.
        handles: usize,
        /// Number of bases supplied.
        bases: usize,
    },

    /// Channel name is not registered.
    #[error("Channel not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
