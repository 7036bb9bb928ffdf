//! Channel implementations: bounded pollable queues, synchronous direct
//! dispatch, the name-based registry, and the polling consumer.

pub mod direct;
pub mod poller;
pub mod queue;
pub mod registry;

pub use direct::DirectChannel;
pub use poller::PollingConsumer;
pub use queue::QueueChannel;
pub use registry::ChannelRegistry;
