//! Pipeline composition: wraps the messaging gateway in the middleware
//! stack and boxes it for sharing.

use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::instrument::InstrumentLayer;
use super::load_shed::LoadShedLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::ServerConfig;
use crate::service::dispatch::{
    DispatchError, DispatchOutcome, DispatchRequest, MessagingGateway,
};

/// The boxed, cloneable dispatch stack shared by HTTP handlers.
pub type DispatchPipeline =
    BoxCloneSyncService<DispatchRequest, DispatchOutcome, DispatchError>;

/// Builds the dispatch pipeline around a [`MessagingGateway`].
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded, before doing any work
/// 2. `TimeoutLayer` -- enforce the per-dispatch deadline
/// 3. `InstrumentLayer` -- record timing and outcome, closest to the gateway
///
/// The result is boxed as a [`DispatchPipeline`] so it can be cloned into
/// every handler invocation; clones share the load-shed semaphore.
#[must_use]
pub fn build_dispatch_pipeline(
    gateway: MessagingGateway,
    config: &ServerConfig,
) -> DispatchPipeline {
    let stack = ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent_dispatches))
        .layer(TimeoutLayer)
        .layer(InstrumentLayer)
        .service(gateway);
    BoxCloneSyncService::new(stack)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
