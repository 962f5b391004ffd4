//! Measurement requests against a channel.

use tracing::instrument;

use qkd_channel::{Basis, QuantumChannel, QubitHandle};

use crate::bitstring::Bitstring;
use crate::error::{ProtocolResult, ensure_same_len};

/// Measure `handles[i]` in the basis named by `bases[i]` and collect the
/// outcomes in order.
///
/// Channel failures abort the whole measurement; no partial bitstring is
/// returned.
#[instrument(skip_all, fields(channel = channel.name(), n = handles.len()))]
pub async fn measure<C>(
    channel: &C,
    bases: &Bitstring,
    handles: &[QubitHandle],
) -> ProtocolResult<Bitstring>
where
    C: QuantumChannel + ?Sized,
{
    ensure_same_len("bases and qubit handles", bases.len(), handles.len())?;
    let bases: Vec<Basis> = bases.bases().collect();
    let bits = channel.measure_all(handles, &bases).await?;
    Ok(Bitstring::from_bits(bits))
}
