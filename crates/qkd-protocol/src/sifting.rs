//! Basis reconciliation and key extraction.
//!
//! Only positions where both parties chose the same basis carry a
//! correlated bit. [`reconcile`] finds them; [`project`] keeps them.

use crate::bitstring::Bitstring;
use crate::error::{ProtocolError, ProtocolResult, ensure_same_len};

/// Ascending indices where the two basis strings agree.
pub fn reconcile(bases_a: &Bitstring, bases_b: &Bitstring) -> ProtocolResult<Vec<usize>> {
    ensure_same_len("basis strings", bases_a.len(), bases_b.len())?;
    Ok(bases_a
        .iter()
        .zip(bases_b.iter())
        .enumerate()
        .filter_map(|(i, (a, b))| (a == b).then_some(i))
        .collect())
}

/// The bits at `indices`, in the order given.
pub fn project(bits: &Bitstring, indices: &[usize]) -> ProtocolResult<Bitstring> {
    indices
        .iter()
        .map(|&index| {
            bits.get(index).ok_or(ProtocolError::IndexOutOfRange {
                index,
                len: bits.len(),
            })
        })
        .collect()
}
