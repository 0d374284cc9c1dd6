//! Aggregator lifecycle: bring up the fleet, publish its catalog, serve, and
//! tear everything down again.
//!
//! ## Startup order
//!
//! 1. Start every child in configuration order (fail-fast)
//! 2. Register each ready child's catalog under its key
//! 3. Begin draining crash notifications into the registry
//! 4. Build the client-facing server over the registry

use std::sync::Arc;

use rmcp::service::QuitReason;
use tracing::info;

use super::config::Config;
use super::error::Result;
use super::server::AggregatorServer;
use super::transport::StdioTransport;
use crate::domains::children::{ChildFleet, ChildReport};
use crate::domains::tools::{CapabilityRegistry, NamespaceRouter};

/// A running aggregator.
pub struct Aggregator {
    config: Arc<Config>,
    registry: Arc<CapabilityRegistry>,
    fleet: ChildFleet,
    server: AggregatorServer,
}

impl Aggregator {
    /// Start every configured child and build the server.
    ///
    /// If any child fails, the children already started are stopped and
    /// that child's error is returned.
    pub async fn start(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let resolver = config.runtime.resolver();

        let mut fleet = ChildFleet::start_all(&config.children, &resolver).await?;

        let registry = Arc::new(CapabilityRegistry::new(config.separator.clone()));
        let registered = fleet.register_catalogs(&registry);
        fleet.watch_crashes(Arc::clone(&registry));

        let children = fleet.keys().into_iter().map(str::to_string).collect();
        let server = AggregatorServer::new(
            Arc::clone(&config),
            NamespaceRouter::new(Arc::clone(&registry)),
            children,
        );

        info!(
            children = fleet.len(),
            tools = registered,
            separator = %config.separator,
            "Aggregator ready"
        );

        Ok(Self {
            config,
            registry,
            fleet,
            server,
        })
    }

    /// A handle to the client-facing server.
    pub fn server(&self) -> AggregatorServer {
        self.server.clone()
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Status of every started child.
    pub fn statuses(&self) -> Vec<ChildReport> {
        self.fleet.statuses()
    }

    /// Serve the client on stdin/stdout until it disconnects.
    pub async fn serve_stdio(&self) -> Result<QuitReason> {
        Ok(StdioTransport::run(self.server()).await?)
    }

    /// Stop every child. Never fails.
    pub async fn shutdown(mut self) {
        info!("Shutting down aggregator");
        self.fleet.stop_all().await;
    }
}
