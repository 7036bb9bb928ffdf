//! Load-shedding middleware for dispatches.
//!
//! Rejects exchanges immediately with [`DispatchError::Overloaded`] once
//! the configured number of dispatches is already in flight. Rejected
//! exchanges do no channel work at all, so an overloaded gateway fails
//! fast instead of queueing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Semaphore;
use tower::{Layer, Service};

use crate::service::dispatch::{DispatchError, DispatchOutcome, DispatchRequest};

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer limiting concurrent dispatches via a shared semaphore.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Creates a layer admitting at most `max_concurrent` dispatches.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: Arc::clone(&self.semaphore),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

/// Service wrapper enforcing the concurrency limit.
#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<DispatchRequest> for LoadShedService<S>
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
        // Acquire without waiting; a saturated semaphore means shed.
        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            return Box::pin(async { Err(DispatchError::Overloaded) });
        };

        let fut = self.inner.call(request);
        Box::pin(async move {
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
