//! Quantum channel abstraction layer.
//!
//! This crate defines the boundary between the classical BB84 protocol and
//! whatever physically prepares and measures qubits: a local simulator, a
//! remote device, or a deterministic test double.
//!
//! # Overview
//!
//! - A common [`QuantumChannel`] trait with `prepare` / `measure`
//! - [`ChannelCapabilities`] to describe the link (noise, capacity)
//! - [`ChannelRegistry`] to create channels by name
//! - [`testing::ScriptedChannel`], a reproducible double for protocol tests
//!
//! # Example: One Qubit
//!
//! ```ignore
//! use qkd_channel::{Basis, PreparedState, QuantumChannel};
//! use qkd_adapter_sim::SimulatorChannel;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let channel = SimulatorChannel::new();
//!
//!     // |−⟩ measured in the diagonal basis always yields 1
//!     let handle = channel.prepare(PreparedState::Minus).await?;
//!     let bit = channel.measure(handle, Basis::Diagonal).await?;
//!     assert!(bit);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Custom Channel
//!
//! ```ignore
//! use qkd_channel::{
//!     Basis, ChannelCapabilities, ChannelResult, PreparedState, QuantumChannel, QubitHandle,
//! };
//! use async_trait::async_trait;
//!
//! struct FibreLink {
//!     capabilities: ChannelCapabilities,
//! }
//!
//! #[async_trait]
//! impl QuantumChannel for FibreLink {
//!     fn name(&self) -> &str { "fibre" }
//!
//!     fn capabilities(&self) -> &ChannelCapabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn prepare(&self, state: PreparedState) -> ChannelResult<QubitHandle> {
//!         // Drive the source
//!         # todo!()
//!     }
//!
//!     async fn measure(&self, handle: QubitHandle, basis: Basis) -> ChannelResult<bool> {
//!         // Read the detector
//!         # todo!()
//!     }
//! }
//! ```

pub mod capability;
pub mod channel;
pub mod error;
pub mod registry;
pub mod state;
pub mod testing;

pub use capability::ChannelCapabilities;
pub use channel::{ChannelConfig, ChannelFactory, QuantumChannel};
pub use error::{ChannelError, ChannelResult};
pub use registry::ChannelRegistry;
pub use state::{Basis, PreparedState, QubitHandle};
