//! Typed errors for evaluation, channel sends, and routing.
//!
//! Unresolved routing keys are deliberately *not* represented here: a key
//! with no route-table entry is a normal outcome (drop or default route),
//! never an error.

/// Errors from a [`RoutingEvaluator`](crate::evaluator::RoutingEvaluator).
///
/// Evaluation failures always surface to the router's caller; the router
/// never converts them into silent drops.
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("payload type `{payload_type}` is not supported by this evaluator")]
    UnsupportedPayload { payload_type: &'static str },
    #[error("evaluation failed: {0}")]
    Failed(#[from] anyhow::Error),
}

/// Errors returned by channel send operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The bounded queue is at capacity. Callers decide whether to retry;
    /// the channel itself does not.
    #[error("channel `{channel}` is full")]
    Full { channel: String },
    /// The channel no longer accepts messages.
    #[error("channel `{channel}` is closed")]
    Closed { channel: String },
    /// A direct channel has nothing subscribed to it.
    #[error("channel `{channel}` has no subscribers")]
    NoSubscribers { channel: String },
    /// A timed send expired while the queue stayed full.
    #[error("send to channel `{channel}` timed out after {timeout_ms}ms")]
    SendTimeout { channel: String, timeout_ms: u64 },
    /// A direct-channel subscriber failed while handling the message.
    /// The failure is surfaced to the sender, not swallowed.
    #[error("handler on channel `{channel}` failed: {source}")]
    Handler {
        channel: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ChannelError {
    /// The name of the channel the failed operation targeted.
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            ChannelError::Full { channel }
            | ChannelError::Closed { channel }
            | ChannelError::NoSubscribers { channel }
            | ChannelError::SendTimeout { channel, .. }
            | ChannelError::Handler { channel, .. } => channel,
        }
    }
}

/// Errors from routing a message.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The predicate evaluator failed; propagated verbatim.
    #[error(transparent)]
    Evaluation(#[from] EvaluateError),
    /// The route table names a channel that is not registered. This is a
    /// wiring fault, distinct from the normal unresolved-key drop.
    #[error("route table references unknown channel `{name}`")]
    UnknownChannel { name: String },
    /// Forwarding to a resolved destination failed.
    #[error(transparent)]
    Send(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_error_reports_channel_name() {
        let err = ChannelError::Full {
            channel: "longStrings".to_string(),
        };
        assert_eq!(err.channel(), "longStrings");
        assert_eq!(err.to_string(), "channel `longStrings` is full");
    }

    #[test]
    fn evaluate_error_wraps_into_router_error() {
        let err: RouterError = EvaluateError::UnsupportedPayload {
            payload_type: "null",
        }
        .into();
        assert!(matches!(err, RouterError::Evaluation(_)));
    }

    #[test]
    fn send_error_wraps_into_router_error() {
        let err: RouterError = ChannelError::Closed {
            channel: "shortStrings".to_string(),
        }
        .into();
        assert!(matches!(err, RouterError::Send(_)));
    }
}
