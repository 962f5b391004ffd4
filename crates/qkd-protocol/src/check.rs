//! Statistical eavesdropper detection.
//!
//! Both parties disclose a sacrificial sample of their raw key and compare
//! it. An intercept-resend attacker corrupts about a quarter of the sifted
//! positions, pushing agreement below the threshold.
//!
//! The comparison is not authenticated: nothing binds which positions were
//! disclosed, so an active attacker controlling the classical channel could
//! swap sample and key positions.

use crate::bitstring::Bitstring;
use crate::error::{ProtocolError, ProtocolResult, ensure_same_len};

/// Default minimum agreement for a sample to pass.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Fraction of positions at which the samples agree.
pub fn agreement(sample_a: &Bitstring, sample_b: &Bitstring) -> ProtocolResult<f64> {
    ensure_same_len("security samples", sample_a.len(), sample_b.len())?;
    if sample_a.is_empty() {
        return Err(ProtocolError::EmptySample);
    }
    Ok(sample_a.matches(sample_b) as f64 / sample_a.len() as f64)
}

/// `true` iff the samples agree on at least `threshold` of their positions.
pub fn check(sample_a: &Bitstring, sample_b: &Bitstring, threshold: f64) -> ProtocolResult<bool> {
    validate_threshold(threshold)?;
    Ok(agreement(sample_a, sample_b)? >= threshold)
}

pub(crate) fn validate_threshold(threshold: f64) -> ProtocolResult<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidThreshold(threshold))
    }
}
