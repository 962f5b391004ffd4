//! Channel capability introspection.
//!
//! Describes what a channel can do and how trustworthy its outcomes are.
//! Protocol drivers use this to size exchanges and report on the link.

use serde::{Deserialize, Serialize};

/// Capabilities of a quantum channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCapabilities {
    /// Name of the channel.
    pub name: String,
    /// Whether this is a simulated link (`true`) vs a physical one (`false`).
    pub is_simulator: bool,
    /// Maximum number of prepared qubits that may wait for measurement.
    pub max_pending_qubits: usize,
    /// Bit-flip probability applied to transmitted qubits, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<f64>,
    /// Additional capability flags: `"statevector"`, `"noisy"`,
    /// `"eavesdropped"`, `"scripted"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl ChannelCapabilities {
    /// Capabilities of an ideal simulated link.
    pub fn simulator(max_pending_qubits: usize) -> Self {
        Self {
            name: "simulator".into(),
            is_simulator: true,
            max_pending_qubits,
            noise: None,
            features: vec!["statevector".into()],
        }
    }

    /// Set the channel name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Record a bit-flip probability. Zero is recorded as noiseless.
    #[must_use]
    pub fn with_noise(mut self, probability: f64) -> Self {
        if probability > 0.0 {
            self.noise = Some(probability);
            self.add_feature("noisy");
        } else {
            self.noise = None;
        }
        self
    }

    /// Add a feature flag once.
    pub fn add_feature(&mut self, feature: &str) {
        if !self.has_feature(feature) {
            self.features.push(feature.to_string());
        }
    }

    /// Check for a feature flag.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// `true` when same-basis measurements are guaranteed to reproduce the
    /// prepared bit.
    pub fn is_noiseless(&self) -> bool {
        self.noise.is_none() && !self.has_feature("eavesdropped")
    }
}
