//! Instrumentation middleware for dispatches.
//!
//! Wraps each exchange in a tracing span and records duration and outcome,
//! plus `metrics` counters/histograms for dashboards.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use metrics::{counter, histogram};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use courier_core::message::header_names;
use courier_core::value::Value;

use crate::service::dispatch::{DispatchError, DispatchOutcome, DispatchRequest};

// ---------------------------------------------------------------------------
// InstrumentLayer
// ---------------------------------------------------------------------------

/// Tower layer instrumenting dispatches with spans, counters, and timings.
#[derive(Debug, Clone)]
pub struct InstrumentLayer;

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService { inner }
    }
}

// ---------------------------------------------------------------------------
// InstrumentService
// ---------------------------------------------------------------------------

/// Service wrapper recording dispatch duration and outcome.
#[derive(Debug, Clone)]
pub struct InstrumentService<S> {
    inner: S,
}

impl<S> Service<DispatchRequest> for InstrumentService<S>
where
    S: Service<DispatchRequest, Response = DispatchOutcome, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = DispatchOutcome;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<DispatchOutcome, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: DispatchRequest) -> Self::Future {
        let correlation_id = request
            .message
            .header(header_names::CORRELATION_ID)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let expect_reply = request.expect_reply;

        let span = info_span!(
            "dispatch",
            correlation_id = %correlation_id,
            expect_reply = expect_reply,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let duration_ms = start.elapsed().as_millis();

                let outcome = match &result {
                    Ok(DispatchOutcome::Reply(_)) => "reply",
                    Ok(DispatchOutcome::Accepted) => "accepted",
                    Err(_) => "error",
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_u64 = duration_ms as u64;
                tracing::Span::current().record("duration_ms", duration_u64);
                tracing::Span::current().record("outcome", outcome);

                counter!("courier_dispatch_total", "outcome" => outcome).increment(1);
                #[allow(clippy::cast_precision_loss)]
                histogram!("courier_dispatch_duration_ms").record(duration_u64 as f64);

                tracing::info!(
                    expect_reply = expect_reply,
                    duration_ms = duration_u64,
                    outcome = outcome,
                    "dispatch complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
