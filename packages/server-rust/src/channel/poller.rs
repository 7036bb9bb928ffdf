//! Polling consumer: drains a pollable channel into a handler.
//!
//! A `PollingConsumer` bridges pull-style queue channels to push-style
//! handlers. A spawned task wakes on a fixed interval, drains every message
//! currently available, and hands each to the handler on the task's thread.
//! Stopping is graceful: the loop drains once more after the stop signal,
//! then the task is awaited to completion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use courier_core::traits::{MessageHandler, PollableChannel};

use crate::endpoint::Endpoint;

/// Running state of a consumer, owned by the endpoint.
struct Running {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodically drains a [`PollableChannel`] into a [`MessageHandler`].
///
/// Handler failures are logged and skipped — a poller has no caller to
/// propagate to, and one bad message must not wedge the channel.
pub struct PollingConsumer {
    name: String,
    channel: Arc<dyn PollableChannel>,
    handler: Arc<dyn MessageHandler>,
    poll_interval: Duration,
    running: Mutex<Option<Running>>,
}

impl PollingConsumer {
    /// Creates a stopped consumer.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        channel: Arc<dyn PollableChannel>,
        handler: Arc<dyn MessageHandler>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            channel,
            handler,
            poll_interval,
            running: Mutex::new(None),
        }
    }

    /// Whether the polling task is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Drains everything currently available into the handler.
    fn drain(channel: &Arc<dyn PollableChannel>, handler: &Arc<dyn MessageHandler>, name: &str) {
        while let Some(message) = channel.try_receive() {
            trace!(consumer = name, "polled message");
            if let Err(err) = handler.handle(message) {
                warn!(consumer = name, error = %err, "handler failed, message skipped");
            }
        }
    }
}

#[async_trait]
impl Endpoint for PollingConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> anyhow::Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Ok(());
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let channel = Arc::clone(&self.channel);
        let handler = Arc::clone(&self.handler);
        let name = self.name.clone();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            // Skip the immediate first tick so a fresh consumer does not
            // race its own wiring.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        PollingConsumer::drain(&channel, &handler, &name);
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }

            // Final drain so messages accepted before the stop signal are
            // not stranded.
            PollingConsumer::drain(&channel, &handler, &name);
        });

        *running = Some(Running { stop_tx, handle });
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let Some(Running { stop_tx, handle }) = self.running.lock().take() else {
            return Ok(());
        };

        // The task may have already exited; a failed send is fine.
        let _ = stop_tx.send(());
        handle.await?;
        Ok(())
    }
}
