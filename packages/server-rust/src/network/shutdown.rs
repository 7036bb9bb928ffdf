//! Graceful shutdown controller with in-flight exchange tracking.
//!
//! Health state lives in an `ArcSwap` so probes and middleware read it
//! lock-free; in-flight exchanges are counted through RAII guards so the
//! count stays accurate even when a handler panics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;

/// Gateway health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Wiring is still in progress; requests are rejected.
    Starting,
    /// Fully operational.
    Ready,
    /// Shutdown triggered; finishing in-flight exchanges only.
    Draining,
    /// All exchanges finished; the process is about to exit.
    Stopped,
}

impl HealthState {
    /// Lowercase name used in health endpoint responses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Starting => "starting",
            HealthState::Ready => "ready",
            HealthState::Draining => "draining",
            HealthState::Stopped => "stopped",
        }
    }
}

/// Coordinates graceful shutdown across the gateway.
///
/// Handlers take an [`InFlightGuard`] per exchange; `trigger_shutdown`
/// flips the state to Draining and notifies every shutdown receiver; the
/// serve loop then calls `wait_for_drain` before exiting.
#[derive(Debug)]
pub struct ShutdownController {
    shutdown_signal: watch::Sender<bool>,
    in_flight: Arc<AtomicU64>,
    health: ArcSwap<HealthState>,
}

impl ShutdownController {
    /// Creates a controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            shutdown_signal: tx,
            in_flight: Arc::new(AtomicU64::new(0)),
            health: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    /// The current health state.
    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health.load()
    }

    /// Whether new exchanges should be admitted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.health_state() == HealthState::Ready
    }

    /// Marks the gateway ready to accept requests.
    pub fn set_ready(&self) {
        self.health.store(Arc::new(HealthState::Ready));
    }

    /// Moves to `Draining` and notifies every shutdown receiver.
    pub fn trigger_shutdown(&self) {
        self.health.store(Arc::new(HealthState::Draining));
        // Receivers may already be gone; that is not an error here.
        let _ = self.shutdown_signal.send(true);
    }

    /// A receiver resolved when shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Tracks one in-flight exchange for the guard's lifetime.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Number of exchanges currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Waits for in-flight exchanges to finish, up to `timeout`.
    ///
    /// Returns `true` and transitions to `Stopped` once the count reaches
    /// zero; returns `false` with the state left at `Draining` when the
    /// timeout expires first.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        while self.in_flight.load(Ordering::Relaxed) > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            // Re-check on a short interval instead of busy-waiting.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.health.store(Arc::new(HealthState::Stopped));
        true
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard decrementing the in-flight counter on drop.
///
/// Drop runs during unwinding too, so a panicking handler still releases
/// its slot.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
