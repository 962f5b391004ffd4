//! Key agreement parameters.

use serde::{Deserialize, Serialize};

use crate::check::{DEFAULT_THRESHOLD, validate_threshold};
use crate::error::{ProtocolError, ProtocolResult};

/// Default number of exchanged positions reserved for the key.
pub const DEFAULT_KEY_LENGTH: usize = 500;
/// Default number of leading positions sacrificed for the security check.
pub const DEFAULT_SAMPLE_LENGTH: usize = 50;
/// Default number of attempts before key generation is abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Parameters of a key agreement.
///
/// Each attempt exchanges `key_length + sample_length` qubits. The first
/// `sample_length` positions feed the security check; the same number of
/// leading raw-key bits is dropped from the final key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Positions exchanged for key material.
    pub key_length: usize,
    /// Positions disclosed for the security check.
    pub sample_length: usize,
    /// Minimum sample agreement.
    pub threshold: f64,
    /// Attempts before giving up.
    pub max_attempts: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_KEY_LENGTH,
            sample_length: DEFAULT_SAMPLE_LENGTH,
            threshold: DEFAULT_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProtocolConfig {
    /// Set the key length.
    #[must_use]
    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    /// Set the sample length.
    #[must_use]
    pub fn with_sample_length(mut self, sample_length: usize) -> Self {
        self.sample_length = sample_length;
        self
    }

    /// Set the agreement threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Qubits exchanged per attempt.
    ///
    /// Saturates on overflow; [`validate`](Self::validate) rejects such
    /// configurations.
    pub fn exchange_length(&self) -> usize {
        self.key_length.saturating_add(self.sample_length)
    }

    /// Reject unusable parameters.
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.key_length == 0 {
            return Err(ProtocolError::InvalidConfig(
                "key_length must be at least 1".into(),
            ));
        }
        if self.sample_length == 0 {
            return Err(ProtocolError::InvalidConfig(
                "sample_length must be at least 1".into(),
            ));
        }
        if self.key_length.checked_add(self.sample_length).is_none() {
            return Err(ProtocolError::InvalidConfig(format!(
                "key_length + sample_length overflows ({} + {})",
                self.key_length, self.sample_length
            )));
        }
        if self.max_attempts == 0 {
            return Err(ProtocolError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        validate_threshold(self.threshold)
            .map_err(|e| ProtocolError::InvalidConfig(e.to_string()))
    }
}
