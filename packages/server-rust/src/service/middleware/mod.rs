//! Tower middleware layers for the dispatch pipeline.
//!
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`timeout`]: Per-dispatch deadline enforcement
//! - [`instrument`]: Timing and outcome via `tracing` spans and `metrics`
//! - [`pipeline`]: Composes all layers into a single boxed service stack

pub mod instrument;
pub mod load_shed;
pub mod pipeline;
pub mod timeout;

pub use instrument::InstrumentLayer;
pub use load_shed::LoadShedLayer;
pub use pipeline::{build_dispatch_pipeline, DispatchPipeline};
pub use timeout::TimeoutLayer;
