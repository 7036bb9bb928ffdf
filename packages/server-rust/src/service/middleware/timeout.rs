//! Timeout middleware for dispatches.
//!
//! Enforces the per-request deadline carried in `DispatchRequest::timeout_ms`
//! and converts expiry into [`DispatchError::Timeout`]. The deadline covers
//! the whole exchange — channel send plus any reply wait.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Layer, Service};

use crate::service::dispatch::{DispatchError, DispatchOutcome, DispatchRequest};

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer wrapping services with per-dispatch deadline enforcement.
///
/// The deadline is read from each request, so callers can budget exchanges
/// individually.
#[derive(Debug, Clone)]
pub struct TimeoutLayer;

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper enforcing per-dispatch deadlines.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
}

impl<S> Service<DispatchRequest> for TimeoutService<S>
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
        let timeout_ms = request.timeout_ms;
        let fut = self.inner.call(request);
        Box::pin(async move {
            match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                Ok(result) => result,
                Err(_elapsed) => Err(DispatchError::Timeout { timeout_ms }),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tower::ServiceExt;

    use courier_core::message::Message;

    use super::*;

    /// Inner service that completes after a configurable delay.
    #[derive(Clone)]
    struct SlowService {
        delay_ms: u64,
    }

    impl Service<DispatchRequest> for SlowService {
        type Response = DispatchOutcome;
        type Error = DispatchError;
        type Future =
            Pin<Box<dyn Future<Output = Result<DispatchOutcome, DispatchError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _request: DispatchRequest) -> Self::Future {
            let delay = self.delay_ms;
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(DispatchOutcome::Accepted)
            })
        }
    }

    fn make_request(timeout_ms: u64) -> DispatchRequest {
        DispatchRequest {
            message: Message::new("cat"),
            expect_reply: false,
            timeout_ms,
        }
    }

    #[tokio::test]
    async fn completes_within_deadline() {
        let svc = TimeoutLayer.layer(SlowService { delay_ms: 10 });
        let outcome = svc.oneshot(make_request(1_000)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Accepted);
    }

    #[tokio::test]
    async fn exceeding_the_deadline_fails() {
        let svc = TimeoutLayer.layer(SlowService { delay_ms: 200 });
        let err = svc.oneshot(make_request(50)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { timeout_ms: 50 }));
    }
}
