//! Intercept-resend eavesdropper.
//!
//! Wraps another channel. For a configurable fraction of qubits the
//! eavesdropper measures in a randomly chosen basis and sends on a fresh
//! qubit prepared in the state it observed. When its basis guess is wrong
//! (half the time) the legitimate same-basis measurement becomes a coin
//! flip, so an intercepted position disagrees with probability 1/4.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use qkd_channel::{
    Basis, ChannelCapabilities, ChannelConfig, ChannelFactory, ChannelResult, PreparedState,
    QuantumChannel, QubitHandle,
};

use crate::simulator::{SimulatorChannel, validate_probability};

/// Channel with an intercept-resend attacker sitting on the link.
pub struct InterceptResendChannel<C> {
    inner: C,
    capabilities: ChannelCapabilities,
    /// Fraction of qubits intercepted.
    ratio: f64,
    rng: Mutex<StdRng>,
    intercepted: AtomicUsize,
}

impl<C: QuantumChannel> InterceptResendChannel<C> {
    /// Intercept a `ratio` fraction of the qubits on `inner`.
    pub fn new(inner: C, ratio: f64) -> ChannelResult<Self> {
        Self::with_rng(inner, ratio, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a fixed seed for the attacker's
    /// choices.
    pub fn with_seed(inner: C, ratio: f64, seed: u64) -> ChannelResult<Self> {
        Self::with_rng(inner, ratio, StdRng::seed_from_u64(seed))
    }

    fn with_rng(inner: C, ratio: f64, rng: StdRng) -> ChannelResult<Self> {
        validate_probability("eavesdrop", ratio)?;
        let mut capabilities = inner.capabilities().clone();
        if ratio > 0.0 {
            capabilities.add_feature("eavesdropped");
        }
        Ok(Self {
            inner,
            capabilities,
            ratio,
            rng: Mutex::new(rng),
            intercepted: AtomicUsize::new(0),
        })
    }

    /// Number of qubits intercepted so far.
    pub fn intercepted(&self) -> usize {
        self.intercepted.load(Ordering::SeqCst)
    }

    /// The wrapped channel.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Decide whether to intercept, and in which basis.
    fn choose(&self) -> Option<Basis> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.gen_bool(self.ratio) {
            Some(Basis::from_bit(rng.r#gen()))
        } else {
            None
        }
    }
}

#[async_trait]
impl<C: QuantumChannel> QuantumChannel for InterceptResendChannel<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> &ChannelCapabilities {
        &self.capabilities
    }

    async fn prepare(&self, state: PreparedState) -> ChannelResult<QubitHandle> {
        self.inner.prepare(state).await
    }

    async fn measure(&self, handle: QubitHandle, basis: Basis) -> ChannelResult<bool> {
        let Some(eve_basis) = self.choose() else {
            return self.inner.measure(handle, basis).await;
        };

        let observed = self.inner.measure(handle, eve_basis).await?;
        let resent = PreparedState::encode(observed, eve_basis);
        trace!(%eve_basis, %resent, "intercepted qubit");
        self.intercepted.fetch_add(1, Ordering::SeqCst);

        let forged = self.inner.prepare(resent).await?;
        self.inner.measure(forged, basis).await
    }

    async fn discard(&self, handles: &[QubitHandle]) -> usize {
        self.inner.discard(handles).await
    }
}

impl ChannelFactory for InterceptResendChannel<SimulatorChannel> {
    fn from_config(config: ChannelConfig) -> ChannelResult<Self> {
        let ratio = config.extra_f64("eavesdrop")?.unwrap_or(1.0);
        let seed = config.extra_u64("seed")?;
        let inner = SimulatorChannel::from_config(config)?;
        match seed {
            // Offset so the attacker does not mirror the simulator's stream.
            Some(seed) => Self::with_seed(inner, ratio, seed.wrapping_add(1)),
            None => Self::new(inner, ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_marked() {
        let channel = InterceptResendChannel::new(SimulatorChannel::new(), 0.5).unwrap();
        assert!(channel.capabilities().has_feature("eavesdropped"));
        assert!(!channel.capabilities().is_noiseless());

        let passive = InterceptResendChannel::new(SimulatorChannel::new(), 0.0).unwrap();
        assert!(passive.capabilities().is_noiseless());
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(InterceptResendChannel::new(SimulatorChannel::new(), 2.0).is_err());
    }

    #[tokio::test]
    async fn test_zero_ratio_is_transparent() {
        let channel =
            InterceptResendChannel::with_seed(SimulatorChannel::with_seed(5), 0.0, 6).unwrap();
        for _ in 0..50 {
            let handle = channel.prepare(PreparedState::Minus).await.unwrap();
            assert!(channel.measure(handle, Basis::Diagonal).await.unwrap());
        }
        assert_eq!(channel.intercepted(), 0);
    }

    #[tokio::test]
    async fn test_full_interception_leaves_no_pending_qubits() {
        let channel =
            InterceptResendChannel::with_seed(SimulatorChannel::with_seed(7), 1.0, 8).unwrap();
        for _ in 0..10 {
            let handle = channel.prepare(PreparedState::Zero).await.unwrap();
            channel.measure(handle, Basis::Rectilinear).await.unwrap();
        }
        assert_eq!(channel.intercepted(), 10);
        assert_eq!(channel.inner().pending(), 0);
    }

    #[tokio::test]
    async fn test_discard_is_not_intercepted() {
        let channel =
            InterceptResendChannel::with_seed(SimulatorChannel::with_seed(9), 1.0, 10).unwrap();
        let handle = channel.prepare(PreparedState::Plus).await.unwrap();

        assert_eq!(channel.discard(&[handle]).await, 1);
        assert_eq!(channel.intercepted(), 0);
        assert_eq!(channel.inner().pending(), 0);
    }
}
