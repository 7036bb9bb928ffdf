//! Gateway module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! requests. The split lets the rest of the application finish wiring
//! (channels, routers, pollers) between `start()` and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::channel::ChannelRegistry;
use crate::service::DispatchPipeline;

use super::config::NetworkConfig;
use super::handlers::{
    channel_send_handler, health_handler, inbound_message_handler, liveness_handler,
    readiness_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;

/// Manages the HTTP gateway lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- captures shared state (channels, dispatch stack, shutdown)
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- accepts requests until the shutdown future resolves
pub struct GatewayModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    channels: Arc<ChannelRegistry>,
    dispatch: DispatchPipeline,
    shutdown: Arc<ShutdownController>,
}

impl GatewayModule {
    /// Creates a gateway module without binding any port.
    ///
    /// The shutdown controller is allocated here so other modules can
    /// subscribe to it before the server starts.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        channels: Arc<ChannelRegistry>,
        dispatch: DispatchPipeline,
    ) -> Self {
        Self {
            config,
            listener: None,
            channels,
            dispatch,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// A shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /messages` -- inbound gateway (request/reply per config)
    /// - `POST /channels/{name}/messages` -- fire-and-forget channel send
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- Kubernetes liveness probe
    /// - `GET /health/ready` -- Kubernetes readiness probe
    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            channels: Arc::clone(&self.channels),
            dispatch: self.dispatch.clone(),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };

        let layers = build_http_layers(&self.config);

        Router::new()
            .route("/messages", post(inbound_message_handler))
            .route("/channels/{name}/messages", post(channel_send_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(layers)
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until the shutdown future resolves, then drains.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// After the shutdown signal:
    /// 1. Health state transitions to Draining
    /// 2. Waits up to 30 seconds for in-flight exchanges to complete
    /// 3. Health state transitions to Stopped
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let shutdown_ctrl = Arc::clone(&self.shutdown);

        let router = self.build_router();

        // Transition to Ready so readiness probes pass.
        shutdown_ctrl.set_ready();
        info!("gateway accepting requests");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        drain(&shutdown_ctrl).await;
        Ok(())
    }
}

/// Drains in-flight exchanges and transitions to Stopped state.
async fn drain(shutdown_ctrl: &ShutdownController) {
    shutdown_ctrl.trigger_shutdown();

    let drained = shutdown_ctrl.wait_for_drain(Duration::from_secs(30)).await;
    if drained {
        info!("all in-flight exchanges drained");
    } else {
        warn!("drain timeout expired with in-flight exchanges remaining");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::QueueChannel;
    use crate::service::{build_dispatch_pipeline, MessagingGateway, ServerConfig};

    fn test_module() -> GatewayModule {
        let channels = Arc::new(ChannelRegistry::new());
        let requests = Arc::new(QueueChannel::new("requests", 16));
        channels.register(requests.clone()).unwrap();

        let dispatch = build_dispatch_pipeline(
            MessagingGateway::new(requests),
            &ServerConfig::default(),
        );
        GatewayModule::new(NetworkConfig::default(), channels, dispatch)
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = test_module();
        assert!(module.listener.is_none());
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = test_module();
        let s1 = module.shutdown_controller();
        let s2 = module.shutdown_controller();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn build_router_creates_router() {
        let module = test_module();
        let _router = module.build_router();
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = test_module();
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "start() must be called before serve()")]
    async fn serve_panics_without_start() {
        let module = test_module();
        let _ = module.serve(std::future::pending::<()>()).await;
    }
}
