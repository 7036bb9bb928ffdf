//! Synchronous point-to-point channel.
//!
//! A `DirectChannel` dispatches each message on the caller's thread to one
//! of its subscribed handlers, chosen round-robin. It is the natural input
//! point for a router: sending a message *is* routing it, and any failure
//! inside the handler surfaces to the sender instead of disappearing into
//! a queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use courier_core::error::ChannelError;
use courier_core::message::Message;
use courier_core::traits::{MessageChannel, MessageHandler};

/// A named channel that invokes a subscriber synchronously per message.
pub struct DirectChannel {
    name: String,
    subscribers: RwLock<Vec<Arc<dyn MessageHandler>>>,
    next: AtomicUsize,
}

impl DirectChannel {
    /// Creates a direct channel with no subscribers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: RwLock::new(Vec::new()),
            next: AtomicUsize::new(0),
        }
    }

    /// Adds a handler to the dispatch rotation.
    pub fn subscribe(&self, handler: Arc<dyn MessageHandler>) {
        self.subscribers.write().push(handler);
    }

    /// Number of subscribed handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[async_trait]
impl MessageChannel for DirectChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, message: Message) -> Result<(), ChannelError> {
        // Clone the chosen handler out so the lock is not held while the
        // handler runs (a handler may itself subscribe or send).
        let handler = {
            let subscribers = self.subscribers.read();
            if subscribers.is_empty() {
                return Err(ChannelError::NoSubscribers {
                    channel: self.name.clone(),
                });
            }
            let index = self.next.fetch_add(1, Ordering::Relaxed) % subscribers.len();
            Arc::clone(&subscribers[index])
        };

        trace!(channel = %self.name, "dispatching message");
        handler.handle(message).map_err(|source| ChannelError::Handler {
            channel: self.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    /// Records payload strings it handles, optionally failing.
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl MessageHandler for Recorder {
        fn handle(&self, message: Message) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("recorder rejected the message");
            }
            self.seen
                .lock()
                .push(message.payload().as_str().unwrap_or("").to_string());
            Ok(())
        }
    }

    fn recorder(seen: &Arc<Mutex<Vec<String>>>) -> Arc<dyn MessageHandler> {
        Arc::new(Recorder {
            seen: Arc::clone(seen),
            fail: false,
        })
    }

    #[test]
    fn send_without_subscribers_fails() {
        let channel = DirectChannel::new("input");
        let err = channel.send(Message::new("cat")).unwrap_err();
        assert!(matches!(err, ChannelError::NoSubscribers { ref channel } if channel == "input"));
    }

    #[test]
    fn single_subscriber_receives_everything() {
        let channel = DirectChannel::new("input");
        let seen = Arc::new(Mutex::new(Vec::new()));
        channel.subscribe(recorder(&seen));

        for payload in ["aardvark", "bear", "cat"] {
            channel.send(Message::new(payload)).unwrap();
        }

        assert_eq!(*seen.lock(), ["aardvark", "bear", "cat"]);
    }

    #[test]
    fn two_subscribers_alternate() {
        let channel = DirectChannel::new("input");
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        channel.subscribe(recorder(&first));
        channel.subscribe(recorder(&second));

        for payload in ["a", "b", "c", "d"] {
            channel.send(Message::new(payload)).unwrap();
        }

        assert_eq!(*first.lock(), ["a", "c"]);
        assert_eq!(*second.lock(), ["b", "d"]);
    }

    #[test]
    fn handler_failure_surfaces_to_sender() {
        let channel = DirectChannel::new("input");
        channel.subscribe(Arc::new(Recorder {
            seen: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }));

        let err = channel.send(Message::new("dog")).unwrap_err();
        match err {
            ChannelError::Handler { channel, source } => {
                assert_eq!(channel, "input");
                assert!(source.to_string().contains("rejected"));
            }
            other => panic!("expected Handler error, got {other:?}"),
        }
    }

    #[test]
    fn closure_handlers_subscribe_directly() {
        let channel = DirectChannel::new("input");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        channel.subscribe(Arc::new(move |message: Message| {
            sink.lock()
                .push(message.payload().as_str().unwrap_or("").to_string());
            Ok(())
        }));

        channel.send(Message::new("elephant")).unwrap();
        assert_eq!(*seen.lock(), ["elephant"]);
    }
}
