/// Server-level configuration for message dispatch.
///
/// Controls dispatch timeouts, concurrency limits, and default channel
/// sizing. Network-facing settings live in
/// [`NetworkConfig`](crate::network::NetworkConfig).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Timeout for sending a request message into its channel, in
    /// milliseconds.
    pub send_timeout_ms: u64,
    /// Timeout for waiting on a reply message, in milliseconds.
    pub receive_timeout_ms: u64,
    /// Overall per-dispatch deadline in milliseconds, enforced by the
    /// timeout middleware.
    pub dispatch_timeout_ms: u64,
    /// Maximum number of concurrent dispatches before load shedding.
    pub max_concurrent_dispatches: u32,
    /// Default capacity for queue channels created from configuration.
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 1_000,
            receive_timeout_ms: 1_000,
            dispatch_timeout_ms: 5_000,
            max_concurrent_dispatches: 1_000,
            channel_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.send_timeout_ms, 1_000);
        assert_eq!(config.receive_timeout_ms, 1_000);
        assert_eq!(config.dispatch_timeout_ms, 5_000);
        assert_eq!(config.max_concurrent_dispatches, 1_000);
        assert_eq!(config.channel_capacity, 256);
    }
}
