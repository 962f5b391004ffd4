//! Error types for the protocol crate.

use thiserror::Error;

/// Errors produced by key agreement and the stream cipher.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Two sequences that must line up position by position do not.
    #[error("Length mismatch: {what} has {left} and {right} elements")]
    LengthMismatch {
        /// Which pair of inputs disagreed.
        what: &'static str,
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
    },

    /// A bitstring length must be positive.
    #[error("Length must be at least 1, got {0}")]
    InvalidLength(usize),

    /// An index points past the end of the bitstring.
    #[error("Index {index} out of range for bitstring of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the bitstring.
        len: usize,
    },

    /// Security check called with nothing to compare.
    #[error("Security check sample is empty")]
    EmptySample,

    /// Threshold outside `[0, 1]`.
    #[error("Threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// A character other than `0` or `1`.
    #[error("Invalid bit '{symbol}' at position {position}")]
    InvalidBitstring {
        /// Position of the offending character.
        position: usize,
        /// The character found.
        symbol: char,
    },

    /// The key is shorter than the message.
    #[error("Key too short: message needs {needed} bits, key has {available}")]
    InsufficientKey {
        /// Bits required.
        needed: usize,
        /// Bits supplied.
        available: usize,
    },

    /// A one-time pad has not got enough unused bits left.
    #[error("One-time pad exhausted: {needed} bits requested, {remaining} unused")]
    KeyExhausted {
        /// Bits requested.
        needed: usize,
        /// Bits never handed out before.
        remaining: usize,
    },

    /// Ciphertext length is not a whole number of bytes.
    #[error("Malformed ciphertext: {0} bits is not a multiple of 8")]
    MalformedCiphertext(usize),

    /// Decrypted bytes are not UTF-8.
    #[error("Decrypted message is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Protocol configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every attempt failed the security check.
    #[error("Key generation failed after {attempts} attempts")]
    KeyGenerationExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// The quantum channel failed.
    #[error("Channel error: {0}")]
    Channel(#[from] qkd_channel::ChannelError),
}

impl ProtocolError {
    /// `true` for caller mistakes: bad lengths, indices, thresholds,
    /// symbols, configuration, or key misuse.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            ProtocolError::LengthMismatch { .. }
                | ProtocolError::InvalidLength(_)
                | ProtocolError::IndexOutOfRange { .. }
                | ProtocolError::EmptySample
                | ProtocolError::InvalidThreshold(_)
                | ProtocolError::InvalidBitstring { .. }
                | ProtocolError::InsufficientKey { .. }
                | ProtocolError::KeyExhausted { .. }
                | ProtocolError::MalformedCiphertext(_)
                | ProtocolError::InvalidConfig(_)
        )
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub(crate) fn ensure_same_len(what: &'static str, left: usize, right: usize) -> ProtocolResult<()> {
    if left == right {
        Ok(())
    } else {
        Err(ProtocolError::LengthMismatch { what, left, right })
    }
}
