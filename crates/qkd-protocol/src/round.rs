//! Key agreement rounds.
//!
//! One attempt walks the phases below; a rejected attempt is thrown away
//! whole and the next one starts again from fresh random strings.
//!
//! ```text
//!   GenerateBitsAndBases → PrepareStates → TransmitMeasure → ReconcileSample
//!     → SecurityCheck ─┬─ pass → ReconcileFull → ExtractKey   (accepted)
//!                      └─ fail → next attempt, or KeyGenerationExhausted
//! ```

use std::fmt;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use qkd_channel::QuantumChannel;

use crate::bitstring::Bitstring;
use crate::check::agreement;
use crate::config::ProtocolConfig;
use crate::encoder::{encode, transmit};
use crate::error::{ProtocolError, ProtocolResult};
use crate::generator::generate_with_rng;
use crate::key::SecureKey;
use crate::measurement::measure;
use crate::sifting::{project, reconcile};

/// Phase of a key agreement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Both parties draw data bits and bases.
    GenerateBitsAndBases,
    /// The Preparer encodes and sends qubits.
    PrepareStates,
    /// The Measurer measures every qubit.
    TransmitMeasure,
    /// Bases are compared over the sample prefix.
    ReconcileSample,
    /// Sample bits are compared.
    SecurityCheck,
    /// Bases are compared over the whole exchange.
    ReconcileFull,
    /// Raw keys are projected and the sample prefix stripped.
    ExtractKey,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::GenerateBitsAndBases => "generate_bits_and_bases",
            RoundPhase::PrepareStates => "prepare_states",
            RoundPhase::TransmitMeasure => "transmit_measure",
            RoundPhase::ReconcileSample => "reconcile_sample",
            RoundPhase::SecurityCheck => "security_check",
            RoundPhase::ReconcileFull => "reconcile_full",
            RoundPhase::ExtractKey => "extract_key",
        };
        f.write_str(name)
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Sample passed and a non-empty key was extracted.
    Accepted,
    /// No basis agreed within the sample prefix.
    EmptySample,
    /// Sample agreement fell below the threshold.
    BelowThreshold,
    /// The raw key was no longer than the stripped prefix.
    EmptyKey,
}

impl AttemptOutcome {
    /// `true` for [`AttemptOutcome::Accepted`].
    pub fn is_accepted(self) -> bool {
        matches!(self, AttemptOutcome::Accepted)
    }
}

/// Summary of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Sifted positions compared in the security check.
    pub sample_size: usize,
    /// Sample agreement, when a sample existed.
    pub agreement: Option<f64>,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Wall time spent on the attempt.
    pub elapsed_ms: u64,
}

/// A key both parties hold after a successful agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreedKey {
    /// The Preparer's key.
    pub preparer: SecureKey,
    /// The Measurer's key. Equal to the Preparer's on a noiseless,
    /// unobserved channel.
    pub measurer: SecureKey,
    /// Attempts used, including the accepted one.
    pub attempts: u32,
    /// Sample agreement of the accepted attempt.
    pub sample_agreement: f64,
    /// Sifted length before the sample prefix was stripped.
    pub raw_length: usize,
    /// Every attempt, in order.
    pub history: Vec<AttemptReport>,
    /// Total wall time.
    pub elapsed_ms: u64,
}

impl AgreedKey {
    /// `true` when both parties ended up with identical keys.
    pub fn keys_match(&self) -> bool {
        self.preparer == self.measurer
    }

    /// Fraction of key positions where the parties disagree.
    pub fn key_error_rate(&self) -> f64 {
        if self.preparer.is_empty() {
            return 0.0;
        }
        let matches = self.preparer.bits().matches(self.measurer.bits());
        1.0 - matches as f64 / self.preparer.len() as f64
    }
}

/// Everything one attempt produces before the accept/reject decision.
enum Attempt {
    Accepted {
        preparer: SecureKey,
        measurer: SecureKey,
        sample_size: usize,
        agreement: f64,
        raw_length: usize,
    },
    Rejected {
        sample_size: usize,
        agreement: Option<f64>,
        outcome: AttemptOutcome,
    },
}

/// BB84 key agreement driver.
///
/// ```rust,ignore
/// use qkd_adapter_sim::SimulatorChannel;
/// use qkd_protocol::{KeyAgreement, ProtocolConfig};
///
/// let agreement = KeyAgreement::new(ProtocolConfig::default())?;
/// let key = agreement.run(&SimulatorChannel::new()).await?;
/// assert!(key.keys_match());
/// ```
#[derive(Debug, Clone)]
pub struct KeyAgreement {
    config: ProtocolConfig,
}

impl KeyAgreement {
    /// Create a driver, rejecting invalid configuration.
    pub fn new(config: ProtocolConfig) -> ProtocolResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Run key agreement with an entropy-seeded generator.
    pub async fn run<C>(&self, channel: &C) -> ProtocolResult<AgreedKey>
    where
        C: QuantumChannel + ?Sized,
    {
        self.run_with_rng(channel, StdRng::from_entropy()).await
    }

    /// Run key agreement drawing every bit and basis from `rng`.
    ///
    /// Attempts draw, in order: Preparer data bits, Preparer bases,
    /// Measurer bases, each `key_length + sample_length` long.
    pub async fn run_with_rng<C, R>(&self, channel: &C, mut rng: R) -> ProtocolResult<AgreedKey>
    where
        C: QuantumChannel + ?Sized,
        R: Rng + Send,
    {
        let start = Instant::now();
        let mut history = Vec::new();

        debug!(
            channel = channel.name(),
            exchange_length = self.config.exchange_length(),
            sample_length = self.config.sample_length,
            threshold = self.config.threshold,
            max_attempts = self.config.max_attempts,
            "starting key agreement"
        );

        for attempt in 1..=self.config.max_attempts {
            let attempt_start = Instant::now();
            let result = self.attempt(channel, &mut rng).await?;
            let elapsed_ms = attempt_start.elapsed().as_millis() as u64;

            match result {
                Attempt::Accepted {
                    preparer,
                    measurer,
                    sample_size,
                    agreement,
                    raw_length,
                } => {
                    history.push(AttemptReport {
                        attempt,
                        sample_size,
                        agreement: Some(agreement),
                        outcome: AttemptOutcome::Accepted,
                        elapsed_ms,
                    });
                    info!(
                        attempt,
                        key_bits = preparer.len(),
                        agreement,
                        elapsed_ms,
                        "key agreement accepted"
                    );
                    return Ok(AgreedKey {
                        preparer,
                        measurer,
                        attempts: attempt,
                        sample_agreement: agreement,
                        raw_length,
                        history,
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Attempt::Rejected {
                    sample_size,
                    agreement,
                    outcome,
                } => {
                    warn!(
                        attempt,
                        sample_size,
                        agreement = agreement.unwrap_or(0.0),
                        ?outcome,
                        elapsed_ms,
                        "attempt rejected"
                    );
                    history.push(AttemptReport {
                        attempt,
                        sample_size,
                        agreement,
                        outcome,
                        elapsed_ms,
                    });
                }
            }
        }

        Err(ProtocolError::KeyGenerationExhausted {
            attempts: self.config.max_attempts,
        })
    }

    async fn attempt<C, R>(&self, channel: &C, rng: &mut R) -> ProtocolResult<Attempt>
    where
        C: QuantumChannel + ?Sized,
        R: Rng + Send,
    {
        let n = self.config.exchange_length();
        let s = self.config.sample_length;

        debug!(phase = %RoundPhase::GenerateBitsAndBases, n);
        let data = generate_with_rng(n, rng)?;
        let sender_bases = generate_with_rng(n, rng)?;
        let receiver_bases = generate_with_rng(n, rng)?;

        debug!(phase = %RoundPhase::PrepareStates);
        let states = encode(&data, &sender_bases)?;
        let handles = transmit(channel, &states).await?;

        debug!(phase = %RoundPhase::TransmitMeasure);
        let measured = match measure(channel, &receiver_bases, &handles).await {
            Ok(measured) => measured,
            Err(err) => {
                let released = channel.discard(&handles).await;
                debug!(released, "released unmeasured qubits");
                return Err(err);
            }
        };

        debug!(phase = %RoundPhase::ReconcileSample);
        let sample_indices = reconcile(&sender_bases.prefix(s)?, &receiver_bases.prefix(s)?)?;
        let sample_size = sample_indices.len();
        if sample_indices.is_empty() {
            return Ok(Attempt::Rejected {
                sample_size,
                agreement: None,
                outcome: AttemptOutcome::EmptySample,
            });
        }
        let preparer_sample = project(&data, &sample_indices)?;
        let measurer_sample = project(&measured, &sample_indices)?;

        debug!(phase = %RoundPhase::SecurityCheck, sample_size);
        let agreement = agreement(&preparer_sample, &measurer_sample)?;
        if agreement < self.config.threshold {
            return Ok(Attempt::Rejected {
                sample_size,
                agreement: Some(agreement),
                outcome: AttemptOutcome::BelowThreshold,
            });
        }

        debug!(phase = %RoundPhase::ReconcileFull);
        let indices = reconcile(&sender_bases, &receiver_bases)?;
        let raw_preparer = project(&data, &indices)?;
        let raw_measurer = project(&measured, &indices)?;

        debug!(phase = %RoundPhase::ExtractKey, raw_length = indices.len());
        if raw_preparer.len() <= s {
            return Ok(Attempt::Rejected {
                sample_size,
                agreement: Some(agreement),
                outcome: AttemptOutcome::EmptyKey,
            });
        }

        Ok(Attempt::Accepted {
            preparer: strip_sample(&raw_preparer, s)?,
            measurer: strip_sample(&raw_measurer, s)?,
            sample_size,
            agreement,
            raw_length: indices.len(),
        })
    }
}

/// Drop the leading `sample_length` raw-key bits.
///
/// The disclosed sample comes from positions below `sample_length`, so it
/// always sits inside this prefix.
fn strip_sample(raw: &Bitstring, sample_length: usize) -> ProtocolResult<SecureKey> {
    raw.suffix_from(sample_length).map(SecureKey::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qkd_channel::testing::ScriptedChannel;

    fn small_config() -> ProtocolConfig {
        ProtocolConfig::default()
            .with_key_length(64)
            .with_sample_length(16)
            .with_max_attempts(3)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProtocolConfig::default().with_key_length(0);
        assert!(matches!(
            KeyAgreement::new(config),
            Err(ProtocolError::InvalidConfig(_))
        ));

        let config = ProtocolConfig::default().with_key_length(usize::MAX);
        assert!(matches!(
            KeyAgreement::new(config),
            Err(ProtocolError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_ideal_channel_agrees_first_time() {
        let agreement = KeyAgreement::new(small_config()).unwrap();
        let key = agreement
            .run_with_rng(&ScriptedChannel::new(), StdRng::seed_from_u64(1))
            .await
            .unwrap();

        assert_eq!(key.attempts, 1);
        assert!(key.keys_match());
        assert!((key.sample_agreement - 1.0).abs() < f64::EPSILON);
        assert_eq!(key.preparer.len(), key.raw_length - 16);
        assert_eq!(key.history.len(), 1);
        assert!(key.history[0].outcome.is_accepted());
        assert_eq!(key.key_error_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_exhaustion_is_named_failure() {
        // Every measurement inverted: agreement is always 0.
        let channel = ScriptedChannel::new().inverting_first(usize::MAX);
        let agreement = KeyAgreement::new(small_config()).unwrap();
        let err = agreement
            .run_with_rng(&channel, StdRng::seed_from_u64(2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProtocolError::KeyGenerationExhausted { attempts: 3 }
        ));
        assert!(!err.is_precondition_violation());
        assert_eq!(channel.measurements(), 3 * 80);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RoundPhase::SecurityCheck.to_string(), "security_check");
        assert_eq!(RoundPhase::GenerateBitsAndBases.to_string(), "generate_bits_and_bases");
    }

    #[test]
    fn test_strip_sample() {
        let raw: Bitstring = "1100101".parse().unwrap();
        assert_eq!(strip_sample(&raw, 3).unwrap().to_string(), "0101");
    }
}
