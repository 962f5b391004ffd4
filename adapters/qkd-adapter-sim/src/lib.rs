//! Local Simulator Channel
//!
//! This crate provides a local quantum channel for testing, development and
//! demonstrations of BB84-style key agreement. Each transmitted qubit is an
//! independent single-qubit statevector; measurement samples the Born rule.
//!
//! # Features
//!
//! - **Exact Preparation**: the four BB84 states built from |0⟩ with X and H
//! - **Measurement Sampling**: collapse in the rectilinear or diagonal basis
//! - **Channel Noise**: optional bit-flip probability within the prepared basis
//! - **Eavesdropping**: [`InterceptResendChannel`] wraps any channel with an
//!   intercept-resend attacker
//!
//! # Example
//!
//! ```ignore
//! use qkd_adapter_sim::{InterceptResendChannel, SimulatorChannel};
//! use qkd_channel::{Basis, PreparedState, QuantumChannel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Every qubit is intercepted
//!     let channel = InterceptResendChannel::new(SimulatorChannel::new(), 1.0)?;
//!
//!     let handle = channel.prepare(PreparedState::Plus).await?;
//!     let bit = channel.measure(handle, Basis::Diagonal).await?;
//!
//!     // Wrong 25% of the time because of the attacker
//!     println!("Measured: {}", bit);
//!
//!     Ok(())
//! }
//! ```

mod eavesdropper;
mod simulator;
mod statevector;

pub use eavesdropper::InterceptResendChannel;
pub use simulator::{DEFAULT_MAX_PENDING, SimulatorChannel};
pub use statevector::Qubit;
