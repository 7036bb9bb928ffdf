//! Message dispatch framework.
//!
//! Inbound exchanges flow through a tower service stack:
//!
//! 1. **Middleware** (`middleware`): load shedding, deadlines, instrumentation
//! 2. **Dispatch** (`dispatch`): `MessagingGateway` sends into the request
//!    channel and waits for replies where expected
//!
//! Configuration for the stack lives in `config`.

pub mod config;
pub mod dispatch;
pub mod middleware;

pub use config::ServerConfig;
pub use dispatch::{DispatchError, DispatchOutcome, DispatchRequest, MessagingGateway};
pub use middleware::{build_dispatch_pipeline, DispatchPipeline};
