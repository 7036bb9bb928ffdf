//! Inbound message gateway handlers.
//!
//! `POST /messages` bridges an HTTP request into the messaging system
//! through the dispatch pipeline and marshals any reply back out.
//! `POST /channels/{name}/messages` is the fire-and-forget variant that
//! targets a registered channel directly, bypassing routing.
//!
//! Body conversion is a fixed mapping, not content negotiation: JSON
//! bodies become structured payloads, MsgPack bodies are decoded, `text/*`
//! bodies become strings, and anything else is carried as raw bytes.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::Serialize;
use tower::ServiceExt;
use tracing::debug;
use uuid::Uuid;

use courier_core::error::ChannelError;
use courier_core::message::{header_names, Message, MessageBuilder};
use courier_core::traits::MessageChannel;
use courier_core::value::Value;

use super::AppState;
use crate::network::config::GatewayConfig;
use crate::service::{DispatchError, DispatchOutcome, DispatchRequest};

const MEDIA_JSON: &str = "application/json";
const MEDIA_MSGPACK: &str = "application/msgpack";

/// JSON error envelope returned on failed exchanges.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Accepts an inbound message and dispatches it through the gateway.
///
/// Replies are returned with `200`; fire-and-forget acceptance is `202`.
/// Overload and full channels map to `503`, deadline and reply expiry to
/// `504`, and handler failures to `500` with the error text in the body.
pub async fn inbound_message_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    if !state.shutdown.is_accepting() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let message = match message_from_request(&headers, &body, &state.config.gateway) {
        Ok(message) => message,
        Err(response) => return response,
    };
    let reply_as_msgpack = content_type(&headers).is_some_and(|ct| ct.starts_with(MEDIA_MSGPACK));

    let request = DispatchRequest {
        message,
        expect_reply: state.config.gateway.expect_reply,
        timeout_ms: u64::try_from(state.config.request_timeout.as_millis()).unwrap_or(u64::MAX),
    };

    match state.dispatch.clone().oneshot(request).await {
        Ok(DispatchOutcome::Reply(reply)) => reply_response(reply, reply_as_msgpack),
        Ok(DispatchOutcome::Accepted) => StatusCode::ACCEPTED.into_response(),
        Err(err) => dispatch_error_response(&err),
    }
}

/// Sends a message directly to a named channel, fire-and-forget.
pub async fn channel_send_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    if !state.shutdown.is_accepting() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let message = match message_from_request(&headers, &body, &state.config.gateway) {
        Ok(message) => message,
        Err(response) => return response,
    };

    let Some(channel) = state.channels.get(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new(format!("unknown channel `{name}`"))),
        )
            .into_response();
    };

    match channel.send(message) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => channel_error_response(&err),
    }
}

/// Builds a message from the request body and mapped headers.
///
/// Returns an HTTP `400` response for bodies that claim to be JSON or
/// MsgPack but do not parse.
fn message_from_request(
    headers: &HeaderMap,
    body: &Bytes,
    config: &GatewayConfig,
) -> Result<Message, Response> {
    let media_type = content_type(headers);

    let payload = match media_type.as_deref() {
        Some(ct) if ct.starts_with(MEDIA_JSON) => {
            let json: serde_json::Value = serde_json::from_slice(body).map_err(|err| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new(format!("invalid JSON body: {err}"))),
                )
                    .into_response()
            })?;
            Value::from(json)
        }
        Some(ct) if ct.starts_with(MEDIA_MSGPACK) => {
            rmp_serde::from_slice::<Value>(body).map_err(|err| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new(format!("invalid MsgPack body: {err}"))),
                )
                    .into_response()
            })?
        }
        Some(ct) if ct.starts_with("text/") => {
            Value::from(String::from_utf8_lossy(body).into_owned())
        }
        _ => Value::Bytes(body.to_vec()),
    };

    let mut builder = MessageBuilder::with_payload(payload)
        .header(header_names::CORRELATION_ID, Uuid::new_v4().to_string())
        .header(header_names::TIMESTAMP, epoch_millis());
    if let Some(ct) = media_type {
        builder = builder.header(header_names::CONTENT_TYPE, ct);
    }

    for (name, value) in headers {
        if !config.maps_header(name.as_str()) {
            continue;
        }
        match value.to_str() {
            Ok(text) => builder = builder.header(name.as_str(), text),
            Err(_) => debug!(header = name.as_str(), "skipping non-UTF-8 mapped header"),
        }
    }

    Ok(builder.build())
}

/// The request's `Content-Type` header as a string, if readable.
fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()
        .map(str::to_owned)
}

/// Marshals a reply message back into an HTTP response.
fn reply_response(reply: Message, as_msgpack: bool) -> Response {
    let (payload, _headers) = reply.into_parts();
    if as_msgpack {
        match rmp_serde::to_vec_named(&payload) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, MEDIA_MSGPACK)],
                bytes,
            )
                .into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(format!("encoding reply failed: {err}"))),
            )
                .into_response(),
        }
    } else {
        (StatusCode::OK, Json(serde_json::Value::from(payload))).into_response()
    }
}

/// Maps dispatch failures onto HTTP statuses.
fn dispatch_error_response(err: &DispatchError) -> Response {
    let status = match err {
        DispatchError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        DispatchError::Timeout { .. } | DispatchError::NoReply { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        DispatchError::Send(send) => return channel_error_response(send),
    };
    (status, Json(ErrorBody::new(err))).into_response()
}

/// Maps channel failures onto HTTP statuses.
fn channel_error_response(err: &ChannelError) -> Response {
    let status = match err {
        ChannelError::Full { .. } | ChannelError::SendTimeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ChannelError::Closed { .. }
        | ChannelError::NoSubscribers { .. }
        | ChannelError::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody::new(err))).into_response()
}

/// Milliseconds since the Unix epoch, clamped into an `i64` header value.
fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
