//! State preparation: classical (bit, basis) pairs to qubits on a channel.

use tracing::{debug, instrument};

use qkd_channel::{PreparedState, QuantumChannel, QubitHandle};

use crate::bitstring::Bitstring;
use crate::error::{ProtocolResult, ensure_same_len};

/// Map each `(data[i], bases[i])` to its BB84 preparation, in order.
pub fn encode(data: &Bitstring, bases: &Bitstring) -> ProtocolResult<Vec<PreparedState>> {
    ensure_same_len("data bits and bases", data.len(), bases.len())?;
    Ok(data
        .iter()
        .zip(bases.bases())
        .map(|(bit, basis)| PreparedState::encode(bit, basis))
        .collect())
}

/// Prepare every state on `channel`, returning handles in the same order.
///
/// If any preparation fails, the qubits already on the channel are
/// discarded before the error is returned.
#[instrument(skip_all, fields(channel = channel.name(), n = states.len()))]
pub async fn transmit<C>(channel: &C, states: &[PreparedState]) -> ProtocolResult<Vec<QubitHandle>>
where
    C: QuantumChannel + ?Sized,
{
    let mut handles = Vec::with_capacity(states.len());
    for &state in states {
        match channel.prepare(state).await {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                let released = channel.discard(&handles).await;
                debug!(prepared = handles.len(), released, "transmission aborted");
                return Err(err.into());
            }
        }
    }
    Ok(handles)
}
