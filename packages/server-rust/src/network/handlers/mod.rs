//! HTTP handler definitions for the inbound gateway.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod gateway;
pub mod health;

pub use gateway::{channel_send_handler, inbound_message_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use crate::channel::ChannelRegistry;
use crate::service::DispatchPipeline;

use super::{NetworkConfig, ShutdownController};

/// Shared application state passed to all axum handlers via `State`
/// extraction.
///
/// Holds `Arc` references (and the boxed dispatch stack, which clones
/// cheaply) so per-request cloning stays inexpensive.
#[derive(Clone)]
pub struct AppState {
    /// Registry of all named channels.
    pub channels: Arc<ChannelRegistry>,
    /// The middleware-wrapped dispatch service.
    pub dispatch: DispatchPipeline,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, timeouts, gateway wiring).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
