//! Simulator channel implementation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, trace};

use qkd_channel::{
    Basis, ChannelCapabilities, ChannelConfig, ChannelError, ChannelFactory, ChannelResult,
    PreparedState, QuantumChannel, QubitHandle,
};

use crate::statevector::Qubit;

/// Default limit on qubits waiting for measurement.
pub const DEFAULT_MAX_PENDING: usize = 4096;

/// Local simulator channel.
///
/// Every prepared qubit is an independent single-qubit statevector kept
/// until it is measured. Optional noise flips the prepared state within its
/// own basis (X on |0⟩/|1⟩, Z on |+⟩/|−⟩) with a fixed probability.
pub struct SimulatorChannel {
    /// Channel configuration.
    config: ChannelConfig,
    /// Capabilities cached at construction.
    capabilities: ChannelCapabilities,
    /// Qubits in flight.
    qubits: Mutex<FxHashMap<QubitHandle, Qubit>>,
    /// Source of measurement and noise randomness.
    rng: Mutex<StdRng>,
    /// Bit-flip probability.
    noise: f64,
    /// Maximum number of qubits in flight.
    max_pending: usize,
}

impl SimulatorChannel {
    /// Create a noiseless simulator seeded from OS entropy.
    pub fn new() -> Self {
        Self::build(
            ChannelConfig::new("simulator"),
            StdRng::from_entropy(),
            0.0,
            DEFAULT_MAX_PENDING,
        )
    }

    /// Create a noiseless simulator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(
            ChannelConfig::new("simulator"),
            StdRng::seed_from_u64(seed),
            0.0,
            DEFAULT_MAX_PENDING,
        )
    }

    /// Set the bit-flip probability.
    pub fn with_noise(mut self, noise: f64) -> ChannelResult<Self> {
        validate_probability("noise", noise)?;
        self.noise = noise;
        self.capabilities = self.capabilities.with_noise(noise);
        Ok(self)
    }

    /// Set the maximum number of qubits in flight.
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self.capabilities.max_pending_qubits = max_pending;
        self
    }

    /// Number of qubits prepared but not yet measured.
    pub fn pending(&self) -> usize {
        self.qubits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn build(config: ChannelConfig, rng: StdRng, noise: f64, max_pending: usize) -> Self {
        let capabilities = ChannelCapabilities::simulator(max_pending)
            .with_name(config.name.clone())
            .with_noise(noise);
        Self {
            config,
            capabilities,
            qubits: Mutex::new(FxHashMap::default()),
            rng: Mutex::new(rng),
            noise,
            max_pending,
        }
    }
}

impl Default for SimulatorChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuantumChannel for SimulatorChannel {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &ChannelCapabilities {
        &self.capabilities
    }

    async fn prepare(&self, state: PreparedState) -> ChannelResult<QubitHandle> {
        let transmitted = if self.noise > 0.0 {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            if rng.gen_bool(self.noise) {
                trace!(%state, "noise flipped prepared state");
                state.flipped()
            } else {
                state
            }
        } else {
            state
        };

        let mut qubits = self.qubits.lock().unwrap_or_else(PoisonError::into_inner);
        if qubits.len() >= self.max_pending {
            return Err(ChannelError::CapacityExceeded {
                pending: qubits.len(),
                limit: self.max_pending,
            });
        }

        let handle = QubitHandle::new();
        qubits.insert(handle, Qubit::prepared(transmitted));
        Ok(handle)
    }

    async fn measure(&self, handle: QubitHandle, basis: Basis) -> ChannelResult<bool> {
        let mut qubit = self
            .qubits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .ok_or(ChannelError::UnknownHandle(handle))?;

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(qubit.measure(basis, &mut *rng))
    }

    #[instrument(skip(self, handles, bases), fields(n = handles.len()))]
    async fn measure_all(
        &self,
        handles: &[QubitHandle],
        bases: &[Basis],
    ) -> ChannelResult<Vec<bool>> {
        if handles.len() != bases.len() {
            return Err(ChannelError::BatchMismatch {
                handles: handles.len(),
                bases: bases.len(),
            });
        }

        // Take every qubit out first so a bad handle leaves the rest untouched.
        let mut taken = Vec::with_capacity(handles.len());
        {
            let mut qubits = self.qubits.lock().unwrap_or_else(PoisonError::into_inner);
            for handle in handles {
                match qubits.remove(handle) {
                    Some(qubit) => taken.push(qubit),
                    None => {
                        for (h, q) in handles.iter().zip(taken) {
                            qubits.insert(*h, q);
                        }
                        return Err(ChannelError::UnknownHandle(*handle));
                    }
                }
            }
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let bits: Vec<bool> = taken
            .iter_mut()
            .zip(bases)
            .map(|(qubit, &basis)| qubit.measure(basis, &mut *rng))
            .collect();

        debug!("Measured {} qubits", bits.len());
        Ok(bits)
    }

    async fn discard(&self, handles: &[QubitHandle]) -> usize {
        let mut qubits = self.qubits.lock().unwrap_or_else(PoisonError::into_inner);
        let released = handles
            .iter()
            .filter(|handle| qubits.remove(*handle).is_some())
            .count();
        debug!("Discarded {released} qubits");
        released
    }
}

impl ChannelFactory for SimulatorChannel {
    fn from_config(config: ChannelConfig) -> ChannelResult<Self> {
        let noise = config.extra_f64("noise")?.unwrap_or(0.0);
        validate_probability("noise", noise)?;
        let max_pending = config
            .extra_u64("max_pending_qubits")?
            .map_or(DEFAULT_MAX_PENDING, |v| v as usize);
        let rng = match config.extra_u64("seed")? {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self::build(config, rng, noise, max_pending))
    }
}

pub(crate) fn validate_probability(key: &str, value: f64) -> ChannelResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ChannelError::Configuration(format!(
            "'{key}' must be a probability in [0, 1], got {value}"
        )))
    }
}
