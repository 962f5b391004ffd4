//! Channel registry for managing available channels.
//!
//! The [`ChannelRegistry`] maps names to constructors so front ends can
//! pick a channel from user input without knowing concrete types.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::channel::{ChannelConfig, ChannelFactory, QuantumChannel};
use crate::error::{ChannelError, ChannelResult};

/// Factory function type for registered channels.
type Factory = Box<dyn Fn(ChannelConfig) -> ChannelResult<Box<dyn QuantumChannel>> + Send + Sync>;

/// Central registry for quantum channels.
pub struct ChannelRegistry {
    factories: FxHashMap<String, Factory>,
}

impl ChannelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a channel type under `name`.
    pub fn register<C>(&mut self, name: impl Into<String>)
    where
        C: ChannelFactory + 'static,
    {
        let name = name.into();
        debug!("Registering channel: {}", name);
        self.factories.insert(
            name,
            Box::new(|config| {
                let channel = C::from_config(config)?;
                Ok(Box::new(channel))
            }),
        );
    }

    /// Register a channel with a custom constructor.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(ChannelConfig) -> ChannelResult<Box<dyn QuantumChannel>>
        + Send
        + Sync
        + 'static,
    ) {
        let name = name.into();
        debug!("Registering channel factory: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Create a channel by name.
    pub fn create(&self, name: &str, config: ChannelConfig) -> ChannelResult<Box<dyn QuantumChannel>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;
        factory(config)
    }

    /// Check whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered channel names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
