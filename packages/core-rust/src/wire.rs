//! Wire codecs for [`Message`] envelopes.
//!
//! Two encodings are supported: JSON for human-facing interop and MsgPack
//! for compact cross-language transport. MsgPack maps are encoded named
//! (`rmp_serde::to_vec_named`) so payloads stay self-describing for
//! non-Rust consumers.

use crate::message::Message;

/// Errors from encoding or decoding a message.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

/// Encodes a message as JSON.
///
/// # Errors
///
/// Returns a [`WireError`] if serialization fails.
pub fn to_json(message: &Message) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decodes a message from JSON.
///
/// # Errors
///
/// Returns a [`WireError`] if the bytes are not a valid JSON envelope.
pub fn from_json(bytes: &[u8]) -> Result<Message, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes a message as named MsgPack.
///
/// # Errors
///
/// Returns a [`WireError`] if serialization fails.
pub fn to_msgpack(message: &Message) -> Result<Vec<u8>, WireError> {
    Ok(rmp_serde::to_vec_named(message)?)
}

/// Decodes a message from MsgPack.
///
/// # Errors
///
/// Returns a [`WireError`] if the bytes are not a valid MsgPack envelope.
pub fn from_msgpack(bytes: &[u8]) -> Result<Message, WireError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{header_names, MessageBuilder};
    use crate::value::Value;

    fn sample() -> Message {
        MessageBuilder::with_payload("elephant")
            .header(header_names::CONTENT_TYPE, "text/plain")
            .header("weightKg", 5400i64)
            .build()
    }

    #[test]
    fn json_preserves_payload_and_headers() {
        let decoded = from_json(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn json_uses_named_fields() {
        let bytes = to_json(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"payload\""));
        assert!(text.contains("\"headers\""));
        assert!(text.contains("\"contentType\""));
    }

    #[test]
    fn msgpack_preserves_payload_and_headers() {
        let decoded = from_msgpack(&to_msgpack(&sample()).unwrap()).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn msgpack_carries_binary_payloads() {
        let message = MessageBuilder::with_payload(Value::Bytes(vec![0, 159, 146, 150])).build();
        let decoded = from_msgpack(&to_msgpack(&message).unwrap()).unwrap();
        assert_eq!(decoded.payload(), &Value::Bytes(vec![0, 159, 146, 150]));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(from_json(b"not json"), Err(WireError::Json(_))));
    }
}
