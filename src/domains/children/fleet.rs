//! Child Fleet - every configured child, started together and stopped
//! together.
//!
//! Startup is sequential and fail-fast in configuration order: the first
//! child that fails aborts the whole fleet, the children started so far are
//! stopped, and that one child's error is returned. After startup the fleet
//! drains crash notifications and drops a crashed child's tools from the
//! registry, leaving every other child alone.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::error::ChildError;
use super::resolver::CommandResolver;
use super::spec::FleetSpec;
use super::supervisor::{ChildHandle, ChildState, ChildStatus, ChildSupervisor, CrashEvent};
use crate::domains::tools::CapabilityRegistry;

/// Status report for one child.
#[derive(Debug, Clone, Serialize)]
pub struct ChildReport {
    pub key: String,
    #[serde(flatten)]
    pub state: ChildState,
    pub tool_count: usize,
}

/// Owns every started child and the crash channel they report on.
#[derive(Debug)]
pub struct ChildFleet {
    children: Vec<ChildHandle>,
    crash_tx: UnboundedSender<CrashEvent>,
    crash_rx: Option<UnboundedReceiver<CrashEvent>>,
    watcher: Option<JoinHandle<()>>,
}

impl ChildFleet {
    /// Create an empty fleet.
    pub fn new() -> Self {
        let (crash_tx, crash_rx) = mpsc::unbounded_channel();
        Self {
            children: Vec::new(),
            crash_tx,
            crash_rx: Some(crash_rx),
            watcher: None,
        }
    }

    /// Start every configured child, in order, stopping at the first failure.
    pub async fn start_all(
        specs: &FleetSpec,
        resolver: &CommandResolver,
    ) -> Result<Self, ChildError> {
        let mut fleet = Self::new();
        fleet.start(specs, resolver).await?;
        Ok(fleet)
    }

    /// Start `specs` into this fleet, in order.
    ///
    /// On the first failure every child this fleet holds is stopped, the
    /// remaining specs are never attempted and the failing child's error is
    /// returned. The stopped handles stay in the fleet for inspection.
    pub async fn start(
        &mut self,
        specs: &FleetSpec,
        resolver: &CommandResolver,
    ) -> Result<(), ChildError> {
        if specs.is_empty() {
            warn!("No child servers configured; the tool catalog will be empty");
            return Ok(());
        }

        info!(count = specs.len(), "Starting child servers");

        for (key, spec) in specs.iter() {
            let supervisor = ChildSupervisor::new(key, spec.clone(), self.crash_tx.clone());
            match supervisor.start(resolver).await {
                Ok(handle) => self.children.push(handle),
                Err(err) => {
                    error!(
                        server = key,
                        started = self.children.len(),
                        "Aborting fleet startup"
                    );
                    self.stop_all().await;
                    return Err(err);
                }
            }
        }

        info!(count = self.children.len(), "All child servers ready");
        Ok(())
    }

    /// Register the catalog of every ready child. Returns the total number of
    /// registered tools.
    pub fn register_catalogs(&self, registry: &CapabilityRegistry) -> usize {
        self.children
            .iter()
            .filter(|child| child.status() == ChildStatus::Ready)
            .map(|child| {
                registry.add_child(child.key(), child.connection(), child.tools().to_vec())
            })
            .sum()
    }

    /// Start draining crash notifications into `registry`.
    ///
    /// Only the first call installs a watcher; later calls return `false`.
    pub fn watch_crashes(&mut self, registry: Arc<CapabilityRegistry>) -> bool {
        let Some(crash_rx) = self.crash_rx.take() else {
            return false;
        };
        self.watcher = Some(tokio::spawn(drain_crashes(crash_rx, registry)));
        true
    }

    /// Stop every child. Always completes; individual failures are logged.
    pub async fn stop_all(&mut self) {
        if !self.children.is_empty() {
            info!(count = self.children.len(), "Stopping child servers");
        }

        join_all(self.children.iter_mut().map(|child| child.stop())).await;

        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }

    pub fn get(&self, key: &str) -> Option<&ChildHandle> {
        self.children.iter().find(|child| child.key() == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.children.iter().map(ChildHandle::key).collect()
    }

    pub fn statuses(&self) -> Vec<ChildReport> {
        self.children
            .iter()
            .map(|child| ChildReport {
                key: child.key().to_string(),
                state: child.state(),
                tool_count: child.tools().len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn crash_sender(&self) -> UnboundedSender<CrashEvent> {
        self.crash_tx.clone()
    }
}

impl Default for ChildFleet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChildFleet {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

async fn drain_crashes(
    mut crash_rx: UnboundedReceiver<CrashEvent>,
    registry: Arc<CapabilityRegistry>,
) {
    while let Some(event) = crash_rx.recv().await {
        let removed = registry.remove_child(&event.key);
        warn!(
            server = %event.key,
            reason = %event.reason,
            removed,
            remaining = registry.len(),
            "Child server dropped from the catalog"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::children::{ChildPhase, ChildSpec};
    use crate::domains::tools::Separator;
    use crate::domains::tools::test_support::{connection, tool};
    use std::time::Duration;

    fn populated_registry() -> Arc<CapabilityRegistry> {
        let registry = Arc::new(CapabilityRegistry::new(Separator::default()));
        for server in ["a", "b", "c"] {
            let names = [format!("{server}1"), format!("{server}2")];
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            registry.add_child(server, connection(&names), names.iter().map(|n| tool(n)).collect());
        }
        registry
    }

    async fn wait_for_len(registry: &CapabilityRegistry, len: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.len() != len {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("registry did not reach expected size");
    }

    #[tokio::test]
    async fn test_crash_removes_only_that_child() {
        let registry = populated_registry();
        assert_eq!(registry.len(), 6);

        let mut fleet = ChildFleet::new();
        assert!(fleet.watch_crashes(Arc::clone(&registry)));
        assert!(!fleet.watch_crashes(Arc::clone(&registry)));

        fleet
            .crash_sender()
            .send(CrashEvent {
                key: "b".to_string(),
                reason: "session ended: Closed".to_string(),
            })
            .unwrap();

        wait_for_len(&registry, 4).await;
        let names = registry.tool_names();
        assert!(names.iter().all(|n| !n.starts_with("b:")));
        for expected in ["a:a1", "a:a2", "c:c1", "c:c2"] {
            assert!(registry.lookup(expected).is_some());
        }

        // A second crash report for the same child is harmless.
        fleet
            .crash_sender()
            .send(CrashEvent {
                key: "b".to_string(),
                reason: "again".to_string(),
            })
            .unwrap();
        fleet
            .crash_sender()
            .send(CrashEvent {
                key: "c".to_string(),
                reason: "session ended: Closed".to_string(),
            })
            .unwrap();
        wait_for_len(&registry, 2).await;

        fleet.stop_all().await;
    }

    #[tokio::test]
    async fn test_empty_fleet_starts() {
        let mut fleet = ChildFleet::start_all(&FleetSpec::new(), &CommandResolver::passthrough())
            .await
            .unwrap();
        assert!(fleet.is_empty());
        assert!(fleet.statuses().is_empty());
        fleet.stop_all().await;
    }

    #[tokio::test]
    async fn test_fail_fast_reports_first_failing_child() {
        let specs = FleetSpec::new()
            .with_child("first", ChildSpec::new("/nonexistent/first-server"))
            .with_child("second", ChildSpec::new("/nonexistent/second-server"));

        let err = ChildFleet::start_all(&specs, &CommandResolver::passthrough())
            .await
            .unwrap_err();
        assert_eq!(err.key, "first");
        assert_eq!(err.phase, ChildPhase::Startup);
    }
}
