//! Bounded FIFO queue channel with non-blocking send and receive.
//!
//! Backed by a bounded `tokio::sync::mpsc` channel for backpressure. The
//! sender side is freely shared across threads; the receiver side lives
//! inside the channel and is serialized by a mutex, so any number of
//! consumers may poll concurrently without coordinating.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use courier_core::error::ChannelError;
use courier_core::message::Message;
use courier_core::traits::{MessageChannel, PollableChannel};

/// How often a timed receive re-checks the queue while waiting.
const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A named bounded FIFO channel.
///
/// `send` never blocks: a full queue reports [`ChannelError::Full`] and the
/// caller decides what to do about it. `try_receive` returns the oldest
/// message or an explicit "none available"; messages are delivered in send
/// order.
pub struct QueueChannel {
    name: String,
    capacity: usize,
    tx: mpsc::Sender<Message>,
    // Held only for the duration of a try_recv, never across an await.
    rx: Mutex<mpsc::Receiver<Message>>,
}

impl QueueChannel {
    /// Creates a queue channel with the given name and capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a bounded channel needs room for at
    /// least one message).
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            name: name.into(),
            capacity,
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl MessageChannel for QueueChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, message: Message) -> Result<(), ChannelError> {
        self.tx.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ChannelError::Full {
                channel: self.name.clone(),
            },
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed {
                channel: self.name.clone(),
            },
        })
    }

    async fn send_timeout(&self, message: Message, timeout: Duration) -> Result<(), ChannelError> {
        match tokio::time::timeout(timeout, self.tx.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ChannelError::Closed {
                channel: self.name.clone(),
            }),
            Err(_) => Err(ChannelError::SendTimeout {
                channel: self.name.clone(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[async_trait]
impl PollableChannel for QueueChannel {
    fn try_receive(&self) -> Option<Message> {
        self.rx.lock().try_recv().ok()
    }

    async fn receive_timeout(&self, timeout: Duration) -> Option<Message> {
        if timeout.is_zero() {
            return self.try_receive();
        }

        // Short-poll until the deadline rather than holding the receiver
        // lock across an await.
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(message) = self.try_receive() {
                return Some(message);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(RECEIVE_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn delivers_in_fifo_order() {
        let channel = QueueChannel::new("shortStrings", 16);
        for payload in ["cat", "dog"] {
            channel.send(Message::new(payload)).unwrap();
        }

        assert_eq!(
            channel.try_receive().unwrap().payload().as_str(),
            Some("cat")
        );
        assert_eq!(
            channel.try_receive().unwrap().payload().as_str(),
            Some("dog")
        );
    }

    #[test]
    fn empty_queue_reports_none_available() {
        let channel = QueueChannel::new("longStrings", 16);
        assert!(channel.try_receive().is_none());
    }

    #[test]
    fn drained_queue_reports_none_available() {
        let channel = QueueChannel::new("longStrings", 16);
        channel.send(Message::new("aardvark")).unwrap();
        assert!(channel.try_receive().is_some());
        assert!(channel.try_receive().is_none());
    }

    #[test]
    fn full_queue_rejects_send() {
        let channel = QueueChannel::new("tiny", 2);
        channel.send(Message::new("a")).unwrap();
        channel.send(Message::new("b")).unwrap();

        let err = channel.send(Message::new("c")).unwrap_err();
        assert!(matches!(err, ChannelError::Full { ref channel } if channel == "tiny"));
    }

    #[tokio::test]
    async fn zero_timeout_receive_equals_try_receive() {
        let channel = QueueChannel::new("q", 4);
        assert!(channel.receive_timeout(Duration::ZERO).await.is_none());

        channel.send(Message::new("bear")).unwrap();
        let received = channel.receive_timeout(Duration::ZERO).await.unwrap();
        assert_eq!(received.payload().as_str(), Some("bear"));
    }

    #[tokio::test]
    async fn timed_receive_picks_up_late_message() {
        let channel = Arc::new(QueueChannel::new("q", 4));

        let sender = Arc::clone(&channel);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            sender.send(Message::new("elephant")).unwrap();
        });

        let received = channel.receive_timeout(Duration::from_secs(2)).await;
        assert_eq!(received.unwrap().payload().as_str(), Some("elephant"));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn timed_receive_expires_empty() {
        let channel = QueueChannel::new("q", 4);
        let received = channel.receive_timeout(Duration::from_millis(30)).await;
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn send_timeout_waits_for_capacity() {
        let channel = Arc::new(QueueChannel::new("tiny", 1));
        channel.send(Message::new("first")).unwrap();

        let drainer = Arc::clone(&channel);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drainer.try_receive()
        });

        channel
            .send_timeout(Message::new("second"), Duration::from_secs(2))
            .await
            .unwrap();

        let drained = handle.await.unwrap().unwrap();
        assert_eq!(drained.payload().as_str(), Some("first"));
        assert_eq!(
            channel.try_receive().unwrap().payload().as_str(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn send_timeout_expires_when_full() {
        let channel = QueueChannel::new("tiny", 1);
        channel.send(Message::new("first")).unwrap();

        let err = channel
            .send_timeout(Message::new("second"), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::SendTimeout { timeout_ms: 30, .. }));
    }

    #[tokio::test]
    async fn concurrent_senders_all_delivered() {
        let channel = Arc::new(QueueChannel::new("q", 128));

        let mut handles = Vec::new();
        for i in 0..8 {
            let sender = Arc::clone(&channel);
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    sender.send(Message::new(format!("{i}-{j}"))).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut count = 0;
        while channel.try_receive().is_some() {
            count += 1;
        }
        assert_eq!(count, 80);
    }
}
