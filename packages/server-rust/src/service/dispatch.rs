//! Message dispatch: the gateway service at the bottom of the middleware
//! pipeline.
//!
//! A [`MessagingGateway`] sends each inbound message into the configured
//! request channel and, when a reply is expected, polls the reply channel
//! until one arrives or the receive timeout expires. Failures are
//! best-effort forwarded to an optional error channel and still propagate
//! to the caller — the gateway never masks a failure with a drop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::Service;
use tracing::debug;

use courier_core::error::ChannelError;
use courier_core::message::{header_names, Message, MessageBuilder};
use courier_core::traits::{MessageChannel, PollableChannel};

// ---------------------------------------------------------------------------
// Request / outcome / error types
// ---------------------------------------------------------------------------

/// One inbound exchange travelling down the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// The message to send into the request channel.
    pub message: Message,
    /// Whether the caller waits for a reply message.
    pub expect_reply: bool,
    /// Overall deadline for this dispatch, enforced by the timeout layer.
    pub timeout_ms: u64,
}

/// Successful result of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A reply message arrived within the receive timeout.
    Reply(Message),
    /// The message was accepted; no reply was requested.
    Accepted,
}

/// Errors surfaced by the dispatch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("server overloaded, try again later")]
    Overloaded,
    #[error("dispatch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("no reply received within {timeout_ms}ms")]
    NoReply { timeout_ms: u64 },
    #[error(transparent)]
    Send(#[from] ChannelError),
}

// ---------------------------------------------------------------------------
// MessagingGateway
// ---------------------------------------------------------------------------

/// Bridges dispatch requests onto messaging channels.
///
/// Cloning is cheap (`Arc` fields) and clones share the underlying
/// channels, so the gateway can sit behind a cloneable service stack.
#[derive(Clone)]
pub struct MessagingGateway {
    request_channel: Arc<dyn MessageChannel>,
    reply_channel: Option<Arc<dyn PollableChannel>>,
    error_channel: Option<Arc<dyn MessageChannel>>,
    send_timeout: Duration,
    receive_timeout: Duration,
}

impl MessagingGateway {
    /// Creates a gateway sending into `request_channel`.
    #[must_use]
    pub fn new(request_channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            request_channel,
            reply_channel: None,
            error_channel: None,
            send_timeout: Duration::from_millis(1_000),
            receive_timeout: Duration::from_millis(1_000),
        }
    }

    /// Sets the channel polled for replies.
    #[must_use]
    pub fn reply_channel(mut self, channel: Arc<dyn PollableChannel>) -> Self {
        self.reply_channel = Some(channel);
        self
    }

    /// Sets the channel receiving failed exchanges.
    #[must_use]
    pub fn error_channel(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.error_channel = Some(channel);
        self
    }

    /// Sets how long a send may wait for channel capacity.
    #[must_use]
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Sets how long to wait for a reply.
    #[must_use]
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Forwards a failed exchange to the error channel, if configured.
    ///
    /// Best effort: the error message derives from the original with the
    /// failure recorded in a header, and a full error channel is only
    /// logged — the original error is what propagates to the caller.
    fn forward_error(&self, original: &Message, error: &DispatchError) {
        let Some(error_channel) = &self.error_channel else {
            return;
        };
        let error_message = MessageBuilder::from_message(original)
            .header(header_names::ERROR_DETAIL, error.to_string())
            .build();
        if let Err(err) = error_channel.send(error_message) {
            debug!(error = %err, "error channel did not accept failed exchange");
        }
    }

    async fn dispatch(self, request: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        let original = request.message.clone();

        let sent = self
            .request_channel
            .send_timeout(request.message, self.send_timeout)
            .await;
        if let Err(err) = sent {
            let error = DispatchError::from(err);
            self.forward_error(&original, &error);
            return Err(error);
        }

        let reply_channel = match (request.expect_reply, &self.reply_channel) {
            (true, Some(channel)) => Arc::clone(channel),
            _ => return Ok(DispatchOutcome::Accepted),
        };

        match reply_channel.receive_timeout(self.receive_timeout).await {
            Some(reply) => Ok(DispatchOutcome::Reply(reply)),
            None => {
                let error = DispatchError::NoReply {
                    timeout_ms: u64::try_from(self.receive_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                };
                self.forward_error(&original, &error);
                Err(error)
            }
        }
    }
}

impl Service<DispatchRequest> for MessagingGateway {
    type Response = DispatchOutcome;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<DispatchOutcome, DispatchError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DispatchRequest) -> Self::Future {
        let gateway = self.clone();
        Box::pin(gateway.dispatch(request))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
