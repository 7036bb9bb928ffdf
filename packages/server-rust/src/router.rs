//! Content-based router: evaluate, resolve, forward.
//!
//! The router owns no state beyond its immutable collaborators — the
//! evaluator, the route table, and the channel registry — so any number of
//! threads may route through it concurrently. Routing is synchronous: a
//! message is either forwarded to completion on the caller's thread or the
//! call fails.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use courier_core::error::RouterError;
use courier_core::evaluator::RoutingEvaluator;
use courier_core::message::Message;
use courier_core::route_table::RouteTable;
use courier_core::traits::{MessageChannel, MessageHandler};

use crate::channel::ChannelRegistry;

/// What happened to a routed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDisposition {
    /// Forwarded to `deliveries` resolved destinations.
    Routed { deliveries: usize },
    /// No key resolved; forwarded to the configured default channel.
    Defaulted,
    /// No key resolved and no default channel exists; silently dropped.
    Dropped,
}

/// Routes messages to channels selected by a pluggable evaluator.
///
/// The evaluator and the route table are independently substitutable:
/// swapping the predicate changes which keys are produced without touching
/// the table, and vice versa.
pub struct ContentRouter {
    evaluator: Arc<dyn RoutingEvaluator>,
    table: RouteTable,
    channels: Arc<ChannelRegistry>,
}

impl ContentRouter {
    /// Creates a router over the given evaluator, table, and registry.
    #[must_use]
    pub fn new(
        evaluator: Arc<dyn RoutingEvaluator>,
        table: RouteTable,
        channels: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            evaluator,
            table,
            channels,
        }
    }

    /// Checks that every destination the table can name is registered.
    ///
    /// Intended for startup wiring, so a typo fails fast instead of on the
    /// first message that happens to hit the bad route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownChannel`] for the first missing
    /// destination.
    pub fn verify_wiring(&self) -> Result<(), RouterError> {
        for name in self.table.destinations() {
            if !self.channels.contains(name) {
                return Err(RouterError::UnknownChannel {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Routes one message.
    ///
    /// The evaluator's keys are resolved against the table in key order,
    /// destinations in table order, and the unmodified message is forwarded
    /// to every resolved destination in that order. A message resolving to
    /// nothing goes to the default channel when one is configured and is
    /// otherwise dropped — a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Evaluation`] when the evaluator fails,
    /// [`RouterError::UnknownChannel`] when a resolved destination is not
    /// registered, and [`RouterError::Send`] when a forward fails. Sends
    /// already made before a failure are not undone.
    pub fn route(&self, message: Message) -> Result<RoutingDisposition, RouterError> {
        let keys = self.evaluator.evaluate(&message)?;

        let mut destinations: Vec<Arc<dyn MessageChannel>> = Vec::new();
        for key in &keys {
            for name in self.table.resolve(key) {
                let channel =
                    self.channels
                        .get(name)
                        .ok_or_else(|| RouterError::UnknownChannel {
                            name: name.clone(),
                        })?;
                destinations.push(channel);
            }
        }

        let Some(last) = destinations.pop() else {
            return self.route_unresolved(message, &keys);
        };

        for channel in &destinations {
            channel.send(message.clone())?;
        }
        last.send(message)?;

        let deliveries = destinations.len() + 1;
        counter!("courier_router_routed_total").increment(deliveries as u64);
        Ok(RoutingDisposition::Routed { deliveries })
    }

    /// The route table this router resolves against.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Default-routes or drops a message none of whose keys resolved.
    fn route_unresolved(
        &self,
        message: Message,
        keys: &[courier_core::evaluator::RoutingKey],
    ) -> Result<RoutingDisposition, RouterError> {
        if let Some(name) = self.table.default_channel() {
            let channel = self
                .channels
                .get(name)
                .ok_or_else(|| RouterError::UnknownChannel {
                    name: name.to_string(),
                })?;
            channel.send(message)?;
            counter!("courier_router_defaulted_total").increment(1);
            return Ok(RoutingDisposition::Defaulted);
        }

        debug!(?keys, "no destination resolved, dropping message");
        counter!("courier_router_dropped_total").increment(1);
        Ok(RoutingDisposition::Dropped)
    }
}

impl MessageHandler for ContentRouter {
    fn handle(&self, message: Message) -> anyhow::Result<()> {
        self.route(message)?;
        Ok(())
    }
}
