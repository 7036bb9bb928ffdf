//! Channel and handler contracts implemented by the server runtime.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::message::Message;

/// A named destination that accepts messages.
///
/// `send` is synchronous and never blocks: a bounded destination that is at
/// capacity reports [`ChannelError::Full`] instead of waiting. Channels must
/// be safe for concurrent sends from multiple threads.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// The channel's registered name.
    fn name(&self) -> &str;

    /// Attempts to deliver a message without blocking.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the message cannot be accepted.
    fn send(&self, message: Message) -> Result<(), ChannelError>;

    /// Delivers a message, waiting up to `timeout` for capacity.
    ///
    /// The default implementation delegates to the non-blocking [`send`],
    /// which is correct for channels with no capacity concept (e.g. direct
    /// dispatch). Bounded queue channels override it with real waiting.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the message cannot be accepted within
    /// the timeout.
    ///
    /// [`send`]: MessageChannel::send
    async fn send_timeout(&self, message: Message, _timeout: Duration) -> Result<(), ChannelError> {
        self.send(message)
    }
}

/// A channel whose messages are pulled by consumers.
///
/// Receiving never blocks indefinitely: `try_receive` returns immediately
/// and `receive_timeout` waits at most the given duration. "No message
/// available" is an explicit `None`, not an error.
#[async_trait]
pub trait PollableChannel: MessageChannel {
    /// Removes and returns the oldest available message, if any.
    fn try_receive(&self) -> Option<Message>;

    /// Waits up to `timeout` for a message.
    ///
    /// A zero timeout is equivalent to [`try_receive`].
    ///
    /// [`try_receive`]: PollableChannel::try_receive
    async fn receive_timeout(&self, timeout: Duration) -> Option<Message>;
}

/// Consumes messages delivered by a channel or poller.
pub trait MessageHandler: Send + Sync {
    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be processed; direct
    /// channels propagate it to the sender as [`ChannelError::Handler`].
    fn handle(&self, message: Message) -> anyhow::Result<()>;
}

impl<F> MessageHandler for F
where
    F: Fn(Message) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, message: Message) -> anyhow::Result<()> {
        self(message)
    }
}
