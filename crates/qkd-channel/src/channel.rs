//! Channel trait and configuration.
//!
//! The [`QuantumChannel`] trait is the only point where quantum behaviour
//! enters a key agreement:
//!
//! ```text
//!   capabilities() ──→ prepare(state) ──→ QubitHandle ──→ measure(handle, basis) ──→ bit
//!    (sync, &ref)         (async)                            (async, consumes)
//! ```
//!
//! ## Contract
//!
//! - Measuring in the basis a state was prepared in returns the prepared
//!   bit (on a noiseless channel).
//! - Measuring in the opposite basis returns a uniformly random bit.
//! - A handle is consumed by its measurement. Measuring it again MUST fail
//!   with [`ChannelError::UnknownHandle`].
//!
//! ## Method table
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&ChannelCapabilities` |
//! | `prepare()` | async | yes | `ChannelResult<QubitHandle>` |
//! | `measure()` | async | yes | `ChannelResult<bool>` |
//! | `measure_all()` | async | provided | `ChannelResult<Vec<bool>>` |
//! | `discard()` | async | provided | `usize` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::ChannelCapabilities;
use crate::error::{ChannelError, ChannelResult};
use crate::state::{Basis, PreparedState, QubitHandle};

/// Configuration for a channel instance.
///
/// Channel-specific settings (`noise`, `seed`, ...) live in `extra` and are
/// read back with the typed accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Name of the channel.
    pub name: String,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChannelConfig {
    /// Create a new channel configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Add extra configuration.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an extra float, rejecting values of the wrong type.
    pub fn extra_f64(&self, key: &str) -> ChannelResult<Option<f64>> {
        match self.extra.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                ChannelError::Configuration(format!("'{key}' must be a number, got {value}"))
            }),
        }
    }

    /// Read an extra unsigned integer, rejecting values of the wrong type.
    pub fn extra_u64(&self, key: &str) -> ChannelResult<Option<u64>> {
        match self.extra.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                ChannelError::Configuration(format!(
                    "'{key}' must be a non-negative integer, got {value}"
                ))
            }),
        }
    }
}

/// Trait for quantum channels.
///
/// Implementations own the quantum side of the exchange; the protocol only
/// ever sees classical descriptors, handles and bits.
#[async_trait]
pub trait QuantumChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &str;

    /// Get the capabilities of this channel.
    ///
    /// Implementations MUST cache capabilities at construction time.
    fn capabilities(&self) -> &ChannelCapabilities;

    /// Prepare a qubit in `state` and put it on the channel.
    async fn prepare(&self, state: PreparedState) -> ChannelResult<QubitHandle>;

    /// Measure the qubit behind `handle` in `basis`, consuming it.
    async fn measure(&self, handle: QubitHandle, basis: Basis) -> ChannelResult<bool>;

    /// Measure a sequence of qubits, position `i` in `bases[i]`.
    ///
    /// Default implementation issues one [`measure`](Self::measure) per
    /// handle, in order. Backends that batch MUST keep the outcome of each
    /// position independent of the others and return results in input
    /// order.
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

        let mut bits = Vec::with_capacity(handles.len());
        for (&handle, &basis) in handles.iter().zip(bases) {
            bits.push(self.measure(handle, basis).await?);
        }
        Ok(bits)
    }

    /// Release qubits that will never be measured, returning how many were
    /// still pending.
    ///
    /// Unknown handles are ignored. The default implementation measures
    /// each handle and drops the outcome; backends that can free a qubit
    /// directly should override it.
    async fn discard(&self, handles: &[QubitHandle]) -> usize {
        let mut released = 0;
        for &handle in handles {
            if self.measure(handle, Basis::Rectilinear).await.is_ok() {
                released += 1;
            }
        }
        released
    }
}

/// Trait for creating channels from configuration.
pub trait ChannelFactory: QuantumChannel + Sized {
    /// Create a channel from configuration.
    fn from_config(config: ChannelConfig) -> ChannelResult<Self>;
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// Channel that relies on every provided method.
    struct Minimal {
        capabilities: ChannelCapabilities,
        qubits: Mutex<Vec<QubitHandle>>,
    }

    #[async_trait]
    impl QuantumChannel for Minimal {
        fn name(&self) -> &str {
            "minimal"
        }

        fn capabilities(&self) -> &ChannelCapabilities {
            &self.capabilities
        }

        async fn prepare(&self, _state: PreparedState) -> ChannelResult<QubitHandle> {
            let handle = QubitHandle::new();
            self.qubits
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle);
            Ok(handle)
        }

        async fn measure(&self, handle: QubitHandle, _basis: Basis) -> ChannelResult<bool> {
            let mut qubits = self.qubits.lock().unwrap_or_else(PoisonError::into_inner);
            let i = qubits
                .iter()
                .position(|h| *h == handle)
                .ok_or(ChannelError::UnknownHandle(handle))?;
            qubits.remove(i);
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_default_discard_counts_released() {
        let channel = Minimal {
            capabilities: ChannelCapabilities::simulator(8),
            qubits: Mutex::new(Vec::new()),
        };
        let a = channel.prepare(PreparedState::Zero).await.unwrap();
        let b = channel.prepare(PreparedState::Minus).await.unwrap();

        assert_eq!(channel.discard(&[a, QubitHandle::new(), b]).await, 2);
        assert!(channel.qubits.lock().unwrap().is_empty());
        assert_eq!(channel.discard(&[a]).await, 0);
    }

    #[test]
    fn test_channel_config() {
        let config = ChannelConfig::new("test").with_extra("noise", serde_json::json!(0.1));

        assert_eq!(config.name, "test");
        assert_eq!(config.extra_f64("noise").unwrap(), Some(0.1));
        assert_eq!(config.extra_f64("missing").unwrap(), None);
    }

    #[test]
    fn test_config_json_is_flat() {
        let config: ChannelConfig =
            serde_json::from_str(r#"{"name": "simulator", "seed": 3}"#).unwrap();
        assert_eq!(config.name, "simulator");
        assert_eq!(config.extra_u64("seed").unwrap(), Some(3));
    }

    #[test]
    fn test_extra_type_errors() {
        let config = ChannelConfig::new("test")
            .with_extra("noise", serde_json::json!("loud"))
            .with_extra("seed", serde_json::json!(-1));

        assert!(matches!(
            config.extra_f64("noise"),
            Err(ChannelError::Configuration(_))
        ));
        assert!(matches!(
            config.extra_u64("seed"),
            Err(ChannelError::Configuration(_))
        ));
    }
}
