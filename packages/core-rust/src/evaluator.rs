//! Routing keys and the pluggable predicate evaluator.
//!
//! The evaluator is the substitution point for routing logic: anything that
//! can compute keys from a message — a closure, a struct with configuration,
//! an embedded expression engine — plugs in behind [`RoutingEvaluator`]
//! without touching the route table or the router.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EvaluateError;
use crate::message::Message;

// ---------------------------------------------------------------------------
// RoutingKey
// ---------------------------------------------------------------------------

/// A value produced by the evaluator and used to select destinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Creates a key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutingKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoutingKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// RoutingEvaluator
// ---------------------------------------------------------------------------

/// Computes routing keys from a message.
///
/// Implementations must behave as pure functions of the message: no mutable
/// state shared across invocations, so concurrent routing from multiple
/// threads needs no synchronization here. Returning an empty key set is a
/// normal outcome (the router drops or default-routes the message); failures
/// are reported through [`EvaluateError`] and surfaced to the caller.
pub trait RoutingEvaluator: Send + Sync {
    /// Evaluates the message, returning zero, one, or many routing keys.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] when the predicate cannot be applied to
    /// the message or the underlying logic fails.
    fn evaluate(&self, message: &Message) -> Result<Vec<RoutingKey>, EvaluateError>;
}

/// Adapts a plain closure into a [`RoutingEvaluator`].
///
/// The native-function substitute for externally scripted predicates.
pub struct FnEvaluator<F>(F);

impl<F> FnEvaluator<F>
where
    F: Fn(&Message) -> Result<Vec<RoutingKey>, EvaluateError> + Send + Sync,
{
    /// Wraps the closure.
    #[must_use]
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RoutingEvaluator for FnEvaluator<F>
where
    F: Fn(&Message) -> Result<Vec<RoutingKey>, EvaluateError> + Send + Sync,
{
    fn evaluate(&self, message: &Message) -> Result<Vec<RoutingKey>, EvaluateError> {
        (self.0)(message)
    }
}

// ---------------------------------------------------------------------------
// LengthThresholdEvaluator
// ---------------------------------------------------------------------------

/// Partitions messages by payload length against a fixed threshold.
///
/// Payloads longer than `threshold` evaluate to the `over` key, all others
/// to the `under` key. Payloads with no defined length (numbers, booleans,
/// null) fail with [`EvaluateError::UnsupportedPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthThresholdEvaluator {
    threshold: usize,
    over: RoutingKey,
    under: RoutingKey,
}

impl LengthThresholdEvaluator {
    /// Creates an evaluator yielding `over` for lengths strictly greater
    /// than `threshold` and `under` otherwise.
    #[must_use]
    pub fn new(threshold: usize, over: impl Into<RoutingKey>, under: impl Into<RoutingKey>) -> Self {
        Self {
            threshold,
            over: over.into(),
            under: under.into(),
        }
    }

    /// The configured threshold.
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl RoutingEvaluator for LengthThresholdEvaluator {
    fn evaluate(&self, message: &Message) -> Result<Vec<RoutingKey>, EvaluateError> {
        let len = message
            .payload()
            .len()
            .ok_or(EvaluateError::UnsupportedPayload {
                payload_type: message.payload().type_name(),
            })?;

        let key = if len > self.threshold {
            self.over.clone()
        } else {
            self.under.clone()
        };
        Ok(vec![key])
    }
}
