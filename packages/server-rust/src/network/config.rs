//! Network and gateway configuration types.

use std::time::Duration;

/// Top-level network configuration for the HTTP inbound gateway.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Gateway channel wiring and header mapping.
    pub gateway: GatewayConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1_048_576, // 1 MB
            gateway: GatewayConfig::default(),
        }
    }
}

/// Gateway behavior: which channels it bridges to and which HTTP headers
/// it copies onto messages.
///
/// Header mapping is a flat allowlist — a header is copied verbatim when
/// its name appears here (case-insensitive), nothing more.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Channel receiving inbound request messages.
    pub request_channel: String,
    /// Channel polled for reply messages, if replies are expected.
    pub reply_channel: Option<String>,
    /// Channel receiving failed exchanges, if configured.
    pub error_channel: Option<String>,
    /// Whether `POST /messages` waits for a reply.
    pub expect_reply: bool,
    /// HTTP request headers copied onto the message, by name.
    pub mapped_headers: Vec<String>,
    /// Maximum time to wait when sending into the request channel.
    pub send_timeout: Duration,
    /// Maximum time to wait for a reply message.
    pub receive_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_channel: "requests".to_string(),
            reply_channel: None,
            error_channel: None,
            expect_reply: false,
            mapped_headers: Vec::new(),
            send_timeout: Duration::from_secs(1),
            receive_timeout: Duration::from_secs(1),
        }
    }
}

impl GatewayConfig {
    /// Whether an inbound HTTP header should be copied onto the message.
    #[must_use]
    pub fn maps_header(&self, name: &str) -> bool {
        self.mapped_headers
            .iter()
            .any(|mapped| mapped.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_channel, "requests");
        assert!(config.reply_channel.is_none());
        assert!(config.error_channel.is_none());
        assert!(!config.expect_reply);
        assert!(config.mapped_headers.is_empty());
    }

    #[test]
    fn header_mapping_is_case_insensitive() {
        let config = GatewayConfig {
            mapped_headers: vec!["X-Tenant".to_string(), "foo".to_string()],
            ..GatewayConfig::default()
        };

        assert!(config.maps_header("x-tenant"));
        assert!(config.maps_header("FOO"));
        assert!(!config.maps_header("bar"));
    }
}
