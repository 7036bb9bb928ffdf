//! The static routing key → destination-channel mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluator::RoutingKey;

/// Immutable mapping from routing keys to ordered destination channel names.
///
/// Built once at startup through [`RouteTableBuilder`] and read-only
/// thereafter, so concurrent routing threads can share it without locks.
/// A key may map to several destinations (delivered in registration order),
/// and several keys may name the same destination. The optional default
/// channel receives messages whose keys resolve to nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    routes: HashMap<RoutingKey, Vec<String>>,
    default_channel: Option<String>,
}

impl RouteTable {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Destination channel names for the given key, in registration order.
    /// An unmapped key yields an empty slice — a normal outcome, not an
    /// error.
    #[must_use]
    pub fn resolve(&self, key: &RoutingKey) -> &[String] {
        self.routes.get(key).map_or(&[], Vec::as_slice)
    }

    /// The channel receiving otherwise-unrouted messages, if configured.
    #[must_use]
    pub fn default_channel(&self) -> Option<&str> {
        self.default_channel.as_deref()
    }

    /// Number of distinct routing keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` when no keys are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over every destination name in the table, including the
    /// default. Used to validate wiring against a channel registry.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.routes
            .values()
            .flatten()
            .map(String::as_str)
            .chain(self.default_channel.as_deref())
    }
}

/// Builder for [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: HashMap<RoutingKey, Vec<String>>,
    default_channel: Option<String>,
}

impl RouteTableBuilder {
    /// Appends a destination for the given key, preserving insertion order
    /// per key. Registering the same pair twice means two deliveries.
    #[must_use]
    pub fn route(mut self, key: impl Into<RoutingKey>, channel: impl Into<String>) -> Self {
        self.routes.entry(key.into()).or_default().push(channel.into());
        self
    }

    /// Sets the default destination for unrouted messages.
    #[must_use]
    pub fn default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = Some(channel.into());
        self
    }

    /// Finalizes the immutable table.
    #[must_use]
    pub fn build(self) -> RouteTable {
        debug!(
            keys = self.routes.len(),
            default = self.default_channel.as_deref().unwrap_or("<none>"),
            "route table built"
        );
        RouteTable {
            routes: self.routes,
            default_channel: self.default_channel,
        }
    }
}
