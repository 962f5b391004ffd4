//! Value types exchanged with a quantum channel.
//!
//! ```text
//!   basis        bit   state
//!   rectilinear   0    |0⟩
//!   rectilinear   1    |1⟩
//!   diagonal      0    |+⟩
//!   diagonal      1    |−⟩
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Preparation and measurement basis for a single qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    /// Computational basis {|0⟩, |1⟩}, written as bit `0`.
    Rectilinear,
    /// Hadamard basis {|+⟩, |−⟩}, written as bit `1`.
    Diagonal,
}

impl Basis {
    /// Read a basis-choice bit.
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    /// The bit this basis is written as in a basis-choice string.
    pub fn as_bit(self) -> bool {
        matches!(self, Basis::Diagonal)
    }

    /// The incompatible basis.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Basis::Rectilinear => Basis::Diagonal,
            Basis::Diagonal => Basis::Rectilinear,
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "rectilinear"),
            Basis::Diagonal => write!(f, "diagonal"),
        }
    }
}

/// One of the four BB84 single-qubit preparations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparedState {
    /// |0⟩
    Zero,
    /// |1⟩
    One,
    /// |+⟩ = H|0⟩
    Plus,
    /// |−⟩ = H|1⟩
    Minus,
}

impl PreparedState {
    /// The state encoding `bit` in `basis`.
    pub fn encode(bit: bool, basis: Basis) -> Self {
        match (basis, bit) {
            (Basis::Rectilinear, false) => PreparedState::Zero,
            (Basis::Rectilinear, true) => PreparedState::One,
            (Basis::Diagonal, false) => PreparedState::Plus,
            (Basis::Diagonal, true) => PreparedState::Minus,
        }
    }

    /// Basis the state was prepared in.
    pub fn basis(self) -> Basis {
        match self {
            PreparedState::Zero | PreparedState::One => Basis::Rectilinear,
            PreparedState::Plus | PreparedState::Minus => Basis::Diagonal,
        }
    }

    /// Bit the state encodes within its own basis.
    pub fn bit(self) -> bool {
        matches!(self, PreparedState::One | PreparedState::Minus)
    }

    /// The orthogonal state in the same basis.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self::encode(!self.bit(), self.basis())
    }
}

impl fmt::Display for PreparedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreparedState::Zero => write!(f, "|0⟩"),
            PreparedState::One => write!(f, "|1⟩"),
            PreparedState::Plus => write!(f, "|+⟩"),
            PreparedState::Minus => write!(f, "|−⟩"),
        }
    }
}

/// Opaque identifier of a prepared qubit travelling through a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QubitHandle(pub Uuid);

impl QubitHandle {
    /// Issue a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QubitHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QubitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_table() {
        assert_eq!(
            PreparedState::encode(false, Basis::Rectilinear),
            PreparedState::Zero
        );
        assert_eq!(
            PreparedState::encode(true, Basis::Rectilinear),
            PreparedState::One
        );
        assert_eq!(
            PreparedState::encode(false, Basis::Diagonal),
            PreparedState::Plus
        );
        assert_eq!(
            PreparedState::encode(true, Basis::Diagonal),
            PreparedState::Minus
        );
    }

    #[test]
    fn test_state_reports_its_basis_and_bit() {
        for basis in [Basis::Rectilinear, Basis::Diagonal] {
            for bit in [false, true] {
                let state = PreparedState::encode(bit, basis);
                assert_eq!(state.basis(), basis);
                assert_eq!(state.bit(), bit);
                assert_eq!(state.flipped().bit(), !bit);
                assert_eq!(state.flipped().basis(), basis);
            }
        }
    }

    #[test]
    fn test_basis_bits() {
        assert_eq!(Basis::from_bit(false), Basis::Rectilinear);
        assert_eq!(Basis::from_bit(true), Basis::Diagonal);
        assert!(Basis::Diagonal.as_bit());
        assert_eq!(Basis::Rectilinear.opposite(), Basis::Diagonal);
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(QubitHandle::new(), QubitHandle::new());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PreparedState::Minus).unwrap();
        assert_eq!(json, "\"minus\"");
        let basis: Basis = serde_json::from_str("\"diagonal\"").unwrap();
        assert_eq!(basis, Basis::Diagonal);
    }
}
