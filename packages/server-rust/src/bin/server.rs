//! Courier server binary.
//!
//! Wires channels, the content router, and the HTTP inbound gateway from
//! command-line configuration, then serves until interrupted. Route table
//! entries are given as repeated `--route key=channel` flags; every named
//! destination gets a bounded queue channel created for it.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_core::evaluator::LengthThresholdEvaluator;
use courier_core::message::Message;
use courier_core::route_table::{RouteTable, RouteTableBuilder};
use courier_core::traits::MessageHandler;
use courier_server::channel::{ChannelRegistry, DirectChannel, PollingConsumer, QueueChannel};
use courier_server::endpoint::EndpointRegistry;
use courier_server::network::{GatewayConfig, GatewayModule, NetworkConfig};
use courier_server::router::ContentRouter;
use courier_server::service::{build_dispatch_pipeline, MessagingGateway, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "courier-server", about = "Content-based message router with an HTTP inbound gateway")]
struct Args {
    /// Bind address.
    #[arg(long, env = "COURIER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Bind port (0 = OS-assigned).
    #[arg(long, env = "COURIER_PORT", default_value_t = 8080)]
    port: u16,

    /// Route table entries as `key=channel`, repeatable.
    #[arg(long = "route", value_name = "KEY=CHANNEL")]
    routes: Vec<String>,

    /// Channel receiving messages whose keys resolve to nothing.
    #[arg(long)]
    default_route: Option<String>,

    /// Payload length threshold for the bundled evaluator.
    #[arg(long, default_value_t = 3)]
    threshold: usize,

    /// Routing key produced for payloads longer than the threshold.
    #[arg(long, default_value = "long")]
    over_key: String,

    /// Routing key produced for payloads at or under the threshold.
    #[arg(long, default_value = "short")]
    under_key: String,

    /// Capacity of each created queue channel.
    #[arg(long, env = "COURIER_CHANNEL_CAPACITY", default_value_t = 256)]
    channel_capacity: usize,

    /// Gateway send timeout in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    send_timeout_ms: u64,

    /// Gateway receive (reply) timeout in milliseconds.
    #[arg(long, default_value_t = 1_000)]
    receive_timeout_ms: u64,

    /// Wait for a reply message on `POST /messages`.
    #[arg(long, default_value_t = false)]
    expect_reply: bool,

    /// Reply channel name (created as a queue channel when set).
    #[arg(long)]
    reply_channel: Option<String>,

    /// Error channel name (created as a queue channel when set).
    #[arg(long)]
    error_channel: Option<String>,

    /// HTTP request headers copied onto messages, repeatable.
    #[arg(long = "map-header", value_name = "NAME")]
    mapped_headers: Vec<String>,

    /// Maximum concurrent dispatches before load shedding.
    #[arg(long, default_value_t = 1_000)]
    max_concurrent: u32,

    /// Expose Prometheus metrics on this address (e.g. `0.0.0.0:9090`).
    #[arg(long, env = "COURIER_METRICS_ADDR")]
    metrics_addr: Option<std::net::SocketAddr>,
}

/// Parses `key=channel` route flags into a route table.
fn parse_routes(entries: &[String], default_route: Option<&str>) -> anyhow::Result<RouteTable> {
    let mut builder = RouteTableBuilder::default();
    for entry in entries {
        let Some((key, channel)) = entry.split_once('=') else {
            anyhow::bail!("invalid route `{entry}`, expected KEY=CHANNEL");
        };
        builder = builder.route(key, channel);
    }
    if let Some(channel) = default_route {
        builder = builder.default_channel(channel);
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "Prometheus exporter listening");
    }

    let table = parse_routes(&args.routes, args.default_route.as_deref())?;

    // One queue channel per distinct destination the table can name.
    let channels = Arc::new(ChannelRegistry::new());
    for name in table.destinations() {
        if !channels.contains(name) {
            channels.register(Arc::new(QueueChannel::new(name, args.channel_capacity)))?;
        }
    }

    let gateway_config = GatewayConfig {
        request_channel: "requests".to_string(),
        reply_channel: args.reply_channel.clone(),
        error_channel: args.error_channel.clone(),
        expect_reply: args.expect_reply,
        mapped_headers: args.mapped_headers.clone(),
        send_timeout: Duration::from_millis(args.send_timeout_ms),
        receive_timeout: Duration::from_millis(args.receive_timeout_ms),
    };

    // The router subscribes to the direct request channel, so an HTTP send
    // routes on the handler's thread.
    let requests = Arc::new(DirectChannel::new(gateway_config.request_channel.clone()));
    let evaluator = Arc::new(LengthThresholdEvaluator::new(
        args.threshold,
        args.over_key.as_str(),
        args.under_key.as_str(),
    ));
    let router = Arc::new(ContentRouter::new(evaluator, table, Arc::clone(&channels)));
    router.verify_wiring()?;
    requests.subscribe(router);
    channels.register(Arc::clone(&requests))?;

    let mut gateway = MessagingGateway::new(requests)
        .send_timeout(gateway_config.send_timeout)
        .receive_timeout(gateway_config.receive_timeout);
    if let Some(name) = &gateway_config.reply_channel {
        let replies = Arc::new(QueueChannel::new(name, args.channel_capacity));
        channels.register(Arc::clone(&replies))?;
        gateway = gateway.reply_channel(replies);
    }
    // Failed exchanges are drained off the error channel into the log by a
    // polling consumer.
    let endpoints = EndpointRegistry::new();
    if let Some(name) = &gateway_config.error_channel {
        let errors = Arc::new(QueueChannel::new(name, args.channel_capacity));
        channels.register(Arc::clone(&errors))?;
        gateway = gateway.error_channel(Arc::clone(&errors));

        let log_failed: Arc<dyn MessageHandler> = Arc::new(|message: Message| {
            tracing::warn!(payload = ?message.payload(), "exchange failed");
            Ok(())
        });
        endpoints.register(Arc::new(PollingConsumer::new(
            "errorLogger",
            errors,
            log_failed,
            Duration::from_millis(500),
        )));
    }
    endpoints.start_all().await?;

    let server_config = ServerConfig {
        send_timeout_ms: args.send_timeout_ms,
        receive_timeout_ms: args.receive_timeout_ms,
        max_concurrent_dispatches: args.max_concurrent,
        channel_capacity: args.channel_capacity,
        ..ServerConfig::default()
    };
    let dispatch = build_dispatch_pipeline(gateway, &server_config);

    let network_config = NetworkConfig {
        host: args.host,
        port: args.port,
        gateway: gateway_config,
        ..NetworkConfig::default()
    };

    let mut module = GatewayModule::new(network_config, channels, dispatch);
    let port = module.start().await?;
    info!(port, "courier server started");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, shutting down");
        })
        .await?;

    endpoints.stop_all().await
}
