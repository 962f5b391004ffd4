//! Immutable bit sequences.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qkd_channel::Basis;

use crate::error::{ProtocolError, ProtocolResult};

/// An ordered, fixed-length sequence of bits.
///
/// Written and serialized as a string over `{'0', '1'}`. A bitstring read
/// as a basis choice maps `0` to rectilinear and `1` to diagonal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstring(Vec<bool>);

impl Bitstring {
    /// Wrap a vector of bits.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    /// `len` zero bits.
    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no bits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bit at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    /// The bits as a slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Iterate over the bits.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Iterate over the bits read as basis choices.
    pub fn bases(&self) -> impl Iterator<Item = Basis> + '_ {
        self.iter().map(Basis::from_bit)
    }

    /// The first `len` bits.
    pub fn prefix(&self, len: usize) -> ProtocolResult<Bitstring> {
        self.range(0, len)
    }

    /// Everything after the first `skip` bits.
    pub fn suffix_from(&self, skip: usize) -> ProtocolResult<Bitstring> {
        self.range(skip, self.len())
    }

    /// Bits in `start..end`.
    pub fn range(&self, start: usize, end: usize) -> ProtocolResult<Bitstring> {
        if end > self.len() {
            return Err(ProtocolError::IndexOutOfRange {
                index: end,
                len: self.len(),
            });
        }
        if start > end {
            return Err(ProtocolError::IndexOutOfRange {
                index: start,
                len: end,
            });
        }
        Ok(Self(self.0[start..end].to_vec()))
    }

    /// Number of positions where `self` and `other` agree.
    ///
    /// Only the overlapping prefix is compared.
    pub fn matches(&self, other: &Bitstring) -> usize {
        self.iter().zip(other.iter()).filter(|(a, b)| a == b).count()
    }

    /// Unwrap into the underlying vector.
    pub fn into_bits(self) -> Vec<bool> {
        self.0
    }
}

impl FromStr for Bitstring {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, symbol)| match symbol {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(ProtocolError::InvalidBitstring { position, symbol }),
            })
            .collect::<ProtocolResult<Vec<bool>>>()
            .map(Self)
    }
}

impl TryFrom<String> for Bitstring {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Bitstring> for String {
    fn from(bits: Bitstring) -> Self {
        bits.to_string()
    }
}

impl From<Vec<bool>> for Bitstring {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for Bitstring {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
