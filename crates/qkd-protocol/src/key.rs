//! Final key material.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitstring::Bitstring;

/// Key bits left after the disclosed sample prefix has been stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureKey(Bitstring);

impl SecureKey {
    /// Wrap verified key bits.
    pub fn new(bits: Bitstring) -> Self {
        Self(bits)
    }

    /// Number of key bits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the key has no bits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key bits.
    pub fn bits(&self) -> &Bitstring {
        &self.0
    }

    /// Unwrap into the underlying bitstring.
    pub fn into_bits(self) -> Bitstring {
        self.0
    }
}

impl From<Bitstring> for SecureKey {
    fn from(bits: Bitstring) -> Self {
        Self(bits)
    }
}

impl fmt::Display for SecureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
