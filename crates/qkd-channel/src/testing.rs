//! Deterministic channel double.
//!
//! [`ScriptedChannel`] behaves like an ideal channel for same-basis
//! measurements and replaces quantum randomness with a scripted bit
//! sequence everywhere else, so protocol runs become reproducible.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::capability::ChannelCapabilities;
use crate::channel::{ChannelConfig, ChannelFactory, QuantumChannel};
use crate::error::{ChannelError, ChannelResult};
use crate::state::{Basis, PreparedState, QubitHandle};

/// Channel double with scripted outcomes.
///
/// - Same-basis measurement returns the prepared bit.
/// - Opposite-basis measurement returns the next bit of the script,
///   cycling; the default script is all zeros.
/// - The first `invert_first` measurements return the inverse of what the
///   rules above would give, which is how tests force security-check
///   failures on early attempts.
pub struct ScriptedChannel {
    name: String,
    capabilities: ChannelCapabilities,
    pending: Mutex<FxHashMap<QubitHandle, PreparedState>>,
    script: Vec<bool>,
    cursor: AtomicUsize,
    invert_first: usize,
    measured: AtomicUsize,
    max_pending: usize,
}

impl ScriptedChannel {
    /// Create a channel whose opposite-basis outcomes are all `0`.
    pub fn new() -> Self {
        Self {
            name: "scripted".into(),
            capabilities: ChannelCapabilities {
                name: "scripted".into(),
                is_simulator: true,
                max_pending_qubits: usize::MAX,
                noise: None,
                features: vec!["scripted".into()],
            },
            pending: Mutex::new(FxHashMap::default()),
            script: vec![false],
            cursor: AtomicUsize::new(0),
            invert_first: 0,
            measured: AtomicUsize::new(0),
            max_pending: usize::MAX,
        }
    }

    /// Replace the opposite-basis outcome script. An empty script is
    /// treated as all zeros.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<Vec<bool>>) -> Self {
        let script = script.into();
        self.script = if script.is_empty() { vec![false] } else { script };
        self
    }

    /// Invert the outcome of the first `count` measurements.
    #[must_use]
    pub fn inverting_first(mut self, count: usize) -> Self {
        self.invert_first = count;
        self
    }

    /// Refuse to prepare once `limit` qubits are pending.
    #[must_use]
    pub fn with_max_pending(mut self, limit: usize) -> Self {
        self.max_pending = limit;
        self.capabilities.max_pending_qubits = limit;
        self
    }

    /// Number of measurements performed so far.
    pub fn measurements(&self) -> usize {
        self.measured.load(Ordering::SeqCst)
    }

    /// Number of prepared qubits not yet measured.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_scripted(&self) -> bool {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.script[i % self.script.len()]
    }
}

impl Default for ScriptedChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuantumChannel for ScriptedChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ChannelCapabilities {
        &self.capabilities
    }

    async fn prepare(&self, state: PreparedState) -> ChannelResult<QubitHandle> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() >= self.max_pending {
            return Err(ChannelError::CapacityExceeded {
                pending: pending.len(),
                limit: self.max_pending,
            });
        }

        let handle = QubitHandle::new();
        pending.insert(handle, state);
        Ok(handle)
    }

    async fn measure(&self, handle: QubitHandle, basis: Basis) -> ChannelResult<bool> {
        let state = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .ok_or(ChannelError::UnknownHandle(handle))?;

        let outcome = if state.basis() == basis {
            state.bit()
        } else {
            self.next_scripted()
        };

        let n = self.measured.fetch_add(1, Ordering::SeqCst);
        Ok(if n < self.invert_first { !outcome } else { outcome })
    }

    async fn discard(&self, handles: &[QubitHandle]) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        handles
            .iter()
            .filter(|handle| pending.remove(*handle).is_some())
            .count()
    }
}

impl ChannelFactory for ScriptedChannel {
    fn from_config(config: ChannelConfig) -> ChannelResult<Self> {
        let invert_first = config.extra_u64("invert_first")?.unwrap_or(0) as usize;
        let mut channel = Self::new().inverting_first(invert_first);
        if let Some(limit) = config.extra_u64("max_pending_qubits")? {
            channel = channel.with_max_pending(limit as usize);
        }
        channel.capabilities.name = config.name.clone();
        channel.name = config.name;
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_basis_returns_prepared_bit() {
        let channel = ScriptedChannel::new().with_script(vec![true]);
        for basis in [Basis::Rectilinear, Basis::Diagonal] {
            for bit in [false, true] {
                let handle = channel
                    .prepare(PreparedState::encode(bit, basis))
                    .await
                    .unwrap();
                assert_eq!(channel.measure(handle, basis).await.unwrap(), bit);
            }
        }
    }

    #[tokio::test]
    async fn test_opposite_basis_follows_script() {
        let channel = ScriptedChannel::new().with_script(vec![true, false, true]);
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            let handle = channel.prepare(PreparedState::Zero).await.unwrap();
            outcomes.push(channel.measure(handle, Basis::Diagonal).await.unwrap());
        }
        assert_eq!(outcomes, vec![true, false, true, true]);
    }

    #[tokio::test]
    async fn test_handle_is_consumed() {
        let channel = ScriptedChannel::new();
        let handle = channel.prepare(PreparedState::Plus).await.unwrap();
        assert_eq!(channel.pending(), 1);
        channel.measure(handle, Basis::Diagonal).await.unwrap();
        assert_eq!(channel.pending(), 0);

        let again = channel.measure(handle, Basis::Diagonal).await;
        assert!(matches!(again, Err(ChannelError::UnknownHandle(h)) if h == handle));
    }

    #[tokio::test]
    async fn test_capacity_and_discard() {
        let channel = ScriptedChannel::new().with_max_pending(2);
        let a = channel.prepare(PreparedState::Zero).await.unwrap();
        let b = channel.prepare(PreparedState::One).await.unwrap();
        assert!(matches!(
            channel.prepare(PreparedState::Plus).await,
            Err(ChannelError::CapacityExceeded {
                pending: 2,
                limit: 2
            })
        ));

        assert_eq!(channel.discard(&[a, b, a]).await, 2);
        assert_eq!(channel.pending(), 0);
        assert_eq!(channel.measurements(), 0);
        assert!(channel.prepare(PreparedState::Plus).await.is_ok());
    }

    #[tokio::test]
    async fn test_inverting_first() {
        let channel = ScriptedChannel::new().inverting_first(2);
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            let handle = channel.prepare(PreparedState::One).await.unwrap();
            outcomes.push(channel.measure(handle, Basis::Rectilinear).await.unwrap());
        }
        assert_eq!(outcomes, vec![false, false, true]);
        assert_eq!(channel.measurements(), 3);
    }

    #[tokio::test]
    async fn test_measure_all_checks_lengths() {
        let channel = ScriptedChannel::new();
        let handle = channel.prepare(PreparedState::Zero).await.unwrap();
        let err = channel.measure_all(&[handle], &[]).await;
        assert!(matches!(
            err,
            Err(ChannelError::BatchMismatch {
                handles: 1,
                bases: 0
            })
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ChannelConfig::new("double").with_extra("invert_first", serde_json::json!(5));
        let channel = ScriptedChannel::from_config(config).unwrap();
        assert_eq!(channel.name(), "double");
        assert_eq!(channel.capabilities().name, "double");
        assert_eq!(channel.invert_first, 5);
    }
}
