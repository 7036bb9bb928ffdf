//! HTTP inbound gateway: configuration, handlers, middleware, and shutdown
//! control.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::{GatewayConfig, NetworkConfig};
pub use handlers::AppState;
pub use module::GatewayModule;
pub use shutdown::{HealthState, InFlightGuard, ShutdownController};
