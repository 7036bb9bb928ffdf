//! The immutable message envelope and its builder.
//!
//! A `Message` is a payload plus a set of named headers. Once built it is
//! never mutated; derived messages (for example with an added correlation
//! header) are fresh copies produced through `MessageBuilder::from_message`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Well-known header names used across the runtime.
///
/// Headers are plain string keys; these constants exist so the gateway,
/// router, and tests agree on spelling.
pub mod header_names {
    /// Correlates a reply with the request that produced it.
    pub const CORRELATION_ID: &str = "correlationId";
    /// Media type of the original payload (e.g. `application/json`).
    pub const CONTENT_TYPE: &str = "contentType";
    /// Name of the channel a reply should be sent to.
    pub const REPLY_CHANNEL: &str = "replyChannel";
    /// Human-readable failure description on error-channel messages.
    pub const ERROR_DETAIL: &str = "errorDetail";
    /// Milliseconds since the Unix epoch at which the envelope was created
    /// by an inbound adapter.
    pub const TIMESTAMP: &str = "timestamp";
}

// ---------------------------------------------------------------------------
// MessageHeaders
// ---------------------------------------------------------------------------

/// Read-only header map attached to a message.
///
/// `BTreeMap` keeps iteration and serialization order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageHeaders(BTreeMap<String, Value>);

impl MessageHeaders {
    /// Looks up a header value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns `true` if a header with the given name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a MessageHeaders {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Immutable payload + headers envelope.
///
/// Created by an upstream producer via [`MessageBuilder`]; never mutated
/// after creation. Cloning is the only way to hand the same message to
/// multiple destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    payload: Value,
    headers: MessageHeaders,
}

impl Message {
    /// Shorthand for a headerless message with the given payload.
    #[must_use]
    pub fn new(payload: impl Into<Value>) -> Self {
        MessageBuilder::with_payload(payload).build()
    }

    /// The message payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The message headers.
    #[must_use]
    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    /// Convenience lookup of a single header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    /// Decomposes the envelope into its payload and headers.
    #[must_use]
    pub fn into_parts(self) -> (Value, MessageHeaders) {
        (self.payload, self.headers)
    }
}

// ---------------------------------------------------------------------------
// MessageBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Message`] values.
///
/// The builder is the only place headers can be set; the resulting message
/// is immutable. `from_message` seeds the builder with an existing
/// envelope's payload and headers to produce a derived copy.
#[derive(Debug)]
pub struct MessageBuilder {
    payload: Value,
    headers: BTreeMap<String, Value>,
}

impl MessageBuilder {
    /// Starts a builder with the given payload and no headers.
    #[must_use]
    pub fn with_payload(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Starts a builder seeded with an existing message's payload and headers.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        Self {
            payload: message.payload.clone(),
            headers: message.headers.0.clone(),
        }
    }

    /// Sets a header, replacing any existing value under the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a header only if it is not already present.
    #[must_use]
    pub fn header_if_absent(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.entry(name.into()).or_insert_with(|| value.into());
        self
    }

    /// Removes a header if present.
    #[must_use]
    pub fn remove_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Finalizes the immutable message.
    #[must_use]
    pub fn build(self) -> Message {
        Message {
            payload: self.payload,
            headers: MessageHeaders(self.headers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_headerless_message() {
        let message = Message::new("aardvark");
        assert_eq!(message.payload().as_str(), Some("aardvark"));
        assert!(message.headers().is_empty());
    }

    #[test]
    fn builder_sets_headers() {
        let message = MessageBuilder::with_payload("bear")
            .header(header_names::CONTENT_TYPE, "text/plain")
            .header("custom", 7i64)
            .build();

        assert_eq!(
            message.header(header_names::CONTENT_TYPE),
            Some(&Value::from("text/plain"))
        );
        assert_eq!(message.header("custom"), Some(&Value::Int(7)));
        assert_eq!(message.headers().len(), 2);
    }

    #[test]
    fn header_replaces_existing_value() {
        let message = MessageBuilder::with_payload("cat")
            .header("key", "first")
            .header("key", "second")
            .build();

        assert_eq!(message.header("key"), Some(&Value::from("second")));
        assert_eq!(message.headers().len(), 1);
    }

    #[test]
    fn header_if_absent_keeps_existing_value() {
        let message = MessageBuilder::with_payload("cat")
            .header("key", "kept")
            .header_if_absent("key", "ignored")
            .header_if_absent("other", "set")
            .build();

        assert_eq!(message.header("key"), Some(&Value::from("kept")));
        assert_eq!(message.header("other"), Some(&Value::from("set")));
    }

    #[test]
    fn from_message_derives_a_new_copy() {
        let original = MessageBuilder::with_payload("dog")
            .header("a", 1i64)
            .build();

        let derived = MessageBuilder::from_message(&original)
            .header("b", 2i64)
            .build();

        // The original is untouched; the derived copy carries both headers.
        assert_eq!(original.headers().len(), 1);
        assert_eq!(derived.headers().len(), 2);
        assert_eq!(derived.payload(), original.payload());
        assert_eq!(derived.header("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn remove_header_drops_the_entry() {
        let original = MessageBuilder::with_payload("elephant")
            .header("a", 1i64)
            .header("b", 2i64)
            .build();

        let derived = MessageBuilder::from_message(&original)
            .remove_header("a")
            .build();

        assert!(!derived.headers().contains("a"));
        assert!(derived.headers().contains("b"));
    }

    #[test]
    fn into_parts_returns_payload_and_headers() {
        let message = MessageBuilder::with_payload("cat")
            .header("k", "v")
            .build();

        let (payload, headers) = message.into_parts();
        assert_eq!(payload, Value::from("cat"));
        assert_eq!(headers.get("k"), Some(&Value::from("v")));
    }
}
