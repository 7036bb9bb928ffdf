//! Endpoint lifecycle management.
//!
//! Messaging endpoints (pollers, gateways, bridges) are started and stopped
//! as a group. Startup follows ascending phase order so infrastructure
//! endpoints come up before the endpoints that feed them; shutdown reverses
//! the order actually started. Endpoints marked `auto_startup() == false`
//! are skipped by `start_all` and must be started explicitly.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

// ---------------------------------------------------------------------------
// Endpoint trait
// ---------------------------------------------------------------------------

/// A lifecycle-managed messaging endpoint.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Unique endpoint name.
    fn name(&self) -> &str;

    /// Whether `start_all` should start this endpoint. Defaults to `true`.
    fn auto_startup(&self) -> bool {
        true
    }

    /// Startup ordering weight; lower phases start earlier and stop later.
    /// Defaults to 0.
    fn phase(&self) -> i32 {
        0
    }

    /// Starts the endpoint. Must be idempotent.
    async fn start(&self) -> anyhow::Result<()>;

    /// Stops the endpoint, completing in-flight work where possible.
    async fn stop(&self) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// EndpointRegistry
// ---------------------------------------------------------------------------

/// Registry of endpoints with phase-ordered group start/stop.
pub struct EndpointRegistry {
    endpoints: Mutex<Vec<Arc<dyn Endpoint>>>,
    /// Names in the order they were actually started, for reverse shutdown.
    started: Mutex<Vec<String>>,
}

impl EndpointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Registers an endpoint.
    pub fn register(&self, endpoint: Arc<dyn Endpoint>) {
        self.endpoints.lock().push(endpoint);
    }

    /// Looks up an endpoint by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Endpoint>> {
        self.endpoints
            .lock()
            .iter()
            .find(|endpoint| endpoint.name() == name)
            .cloned()
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn count(&self) -> usize {
        self.endpoints.lock().len()
    }

    /// Starts all auto-startup endpoints in ascending phase order.
    ///
    /// Registration order breaks ties within a phase.
    ///
    /// # Errors
    ///
    /// Stops at the first endpoint whose `start` fails; endpoints already
    /// started stay started and are recorded for `stop_all`.
    pub async fn start_all(&self) -> anyhow::Result<()> {
        let mut ordered: Vec<Arc<dyn Endpoint>> = self.endpoints.lock().clone();
        ordered.sort_by_key(|endpoint| endpoint.phase());

        for endpoint in ordered {
            if !endpoint.auto_startup() {
                continue;
            }
            endpoint.start().await?;
            info!(endpoint = endpoint.name(), phase = endpoint.phase(), "endpoint started");
            self.started.lock().push(endpoint.name().to_string());
        }
        Ok(())
    }

    /// Starts a single endpoint by name, regardless of `auto_startup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unknown or its `start` fails.
    pub async fn start_endpoint(&self, name: &str) -> anyhow::Result<()> {
        let endpoint = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown endpoint `{name}`"))?;
        endpoint.start().await?;
        self.started.lock().push(name.to_string());
        Ok(())
    }

    /// Stops every started endpoint in reverse start order.
    ///
    /// # Errors
    ///
    /// Returns the first stop failure after attempting the full list.
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        let started: Vec<String> = std::mem::take(&mut *self.started.lock());
        let mut first_failure = None;

        for name in started.iter().rev() {
            if let Some(endpoint) = self.get(name) {
                if let Err(err) = endpoint.stop().await {
                    first_failure.get_or_insert(err);
                } else {
                    info!(endpoint = name.as_str(), "endpoint stopped");
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Endpoint that appends lifecycle events to a shared log.
    struct ProbeEndpoint {
        endpoint_name: &'static str,
        startup_phase: i32,
        auto: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Endpoint for ProbeEndpoint {
        fn name(&self) -> &str {
            self.endpoint_name
        }

        fn auto_startup(&self) -> bool {
            self.auto
        }

        fn phase(&self) -> i32 {
            self.startup_phase
        }

        async fn start(&self) -> anyhow::Result<()> {
            self.log.lock().push(format!("start:{}", self.endpoint_name));
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.log.lock().push(format!("stop:{}", self.endpoint_name));
            Ok(())
        }
    }

    fn probe(
        name: &'static str,
        phase: i32,
        auto: bool,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Endpoint> {
        Arc::new(ProbeEndpoint {
            endpoint_name: name,
            startup_phase: phase,
            auto,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn start_all_follows_phase_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = EndpointRegistry::new();
        registry.register(probe("late", 1001, true, &log));
        registry.register(probe("early", -1, true, &log));
        registry.register(probe("middle", 0, true, &log));

        registry.start_all().await.unwrap();

        assert_eq!(*log.lock(), ["start:early", "start:middle", "start:late"]);
    }

    #[tokio::test]
    async fn stop_all_reverses_start_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = EndpointRegistry::new();
        registry.register(probe("a", 0, true, &log));
        registry.register(probe("b", 1, true, &log));

        registry.start_all().await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(
            *log.lock(),
            ["start:a", "start:b", "stop:b", "stop:a"]
        );
    }

    #[tokio::test]
    async fn non_auto_endpoints_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = EndpointRegistry::new();
        registry.register(probe("auto", 0, true, &log));
        registry.register(probe("manual", 0, false, &log));

        registry.start_all().await.unwrap();
        assert_eq!(*log.lock(), ["start:auto"]);

        registry.start_endpoint("manual").await.unwrap();
        assert_eq!(*log.lock(), ["start:auto", "start:manual"]);
    }

    #[tokio::test]
    async fn stop_all_only_stops_started_endpoints() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = EndpointRegistry::new();
        registry.register(probe("auto", 0, true, &log));
        registry.register(probe("manual", 0, false, &log));

        registry.start_all().await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(*log.lock(), ["start:auto", "stop:auto"]);
    }

    #[tokio::test]
    async fn start_unknown_endpoint_errors() {
        let registry = EndpointRegistry::new();
        let err = registry.start_endpoint("ghost").await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
