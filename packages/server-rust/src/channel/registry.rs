//! Name-based channel registry.
//!
//! Built during wiring, read-mostly afterwards. `DashMap` keeps lookups
//! lock-free so concurrent routers can resolve destinations without
//! contending with each other.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use courier_core::traits::MessageChannel;

/// Thread-safe registry of channels by name.
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<dyn MessageChannel>>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Registers a channel under its own name.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel with the same name is already
    /// registered; silently replacing a wired channel hides configuration
    /// mistakes.
    pub fn register(&self, channel: Arc<dyn MessageChannel>) -> anyhow::Result<()> {
        let name = channel.name().to_string();
        match self.channels.entry(name.clone()) {
            Entry::Occupied(_) => {
                anyhow::bail!("channel `{name}` is already registered")
            }
            Entry::Vacant(entry) => {
                entry.insert(channel);
                Ok(())
            }
        }
    }

    /// Looks up a channel by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn MessageChannel>> {
        self.channels.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns `true` if a channel with the given name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Number of registered channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channels.len()
    }

    /// Registered channel names as a collected `Vec`.
    ///
    /// `DashMap` iteration yields guard types that borrow the map, so the
    /// names are collected into owned values.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
