//! Child Supervisor - lifecycle of one child MCP server process.
//!
//! `STARTING -> READY -> FAILED | STOPPED`. A supervisor resolves and spawns
//! the command, waits for the MCP handshake, fetches the tool catalog once as
//! a liveness check and then hands back a [`ChildHandle`]. From then on a
//! monitor task owns the session and reports an unexpected end of the session
//! on the crash channel. There is no automatic restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rmcp::{
    ServiceExt,
    model::Tool,
    service::{Peer, RoleClient, RunningService, RunningServiceCancellationToken},
    transport::TokioChildProcess,
};
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::error::ChildError;
use super::resolver::CommandResolver;
use super::spec::ChildSpec;
use crate::domains::tools::ToolConnection;

/// How long a child gets to wind down its session on stop.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type ChildService = RunningService<RoleClient, ()>;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChildStatus {
    Starting,
    Ready,
    Failed,
    Stopped,
}

impl std::fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Starting => "STARTING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Mutable part of a child's state, shared with its monitor task.
#[derive(Debug, Clone, Serialize)]
pub struct ChildState {
    pub status: ChildStatus,
    pub last_error: Option<String>,
    pub ready_at: Option<DateTime<Utc>>,
}

impl Default for ChildState {
    fn default() -> Self {
        Self {
            status: ChildStatus::Starting,
            last_error: None,
            ready_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SharedState(Arc<RwLock<ChildState>>);

impl SharedState {
    fn snapshot(&self) -> ChildState {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut ChildState)) {
        f(&mut self.0.write().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Notification that a ready child's session ended without being asked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashEvent {
    /// Key of the child that went away.
    pub key: String,

    /// Why the session ended.
    pub reason: String,
}

// ============================================================================
// Supervisor
// ============================================================================

/// Starts one configured child and wires its crash notifications.
pub struct ChildSupervisor {
    key: String,
    spec: ChildSpec,
    crash_tx: UnboundedSender<CrashEvent>,
}

impl ChildSupervisor {
    /// Create a supervisor whose crash notifications go to `crash_tx`.
    pub fn new(
        key: impl Into<String>,
        spec: ChildSpec,
        crash_tx: UnboundedSender<CrashEvent>,
    ) -> Self {
        Self {
            key: key.into(),
            spec,
            crash_tx,
        }
    }

    /// Spawn the child and bring it to `READY`.
    ///
    /// Nothing is retried; a spawn failure is reported as the `startup`
    /// phase, a failed handshake or catalog fetch as `initialization`.
    #[instrument(skip_all, fields(server = %self.key))]
    pub async fn start(self, resolver: &CommandResolver) -> Result<ChildHandle, ChildError> {
        let state = SharedState::default();
        let command = resolver.resolve(&self.spec.command);

        let mut cmd = Command::new(&command);
        cmd.args(&self.spec.args).envs(&self.spec.env);

        debug!(command = %command, args = ?self.spec.args, "Spawning child server");

        let transport = TokioChildProcess::new(cmd).map_err(|e| {
            let err = ChildError::startup(&self.key, e);
            error!(error = %err, "Failed to spawn child server");
            err
        })?;

        let service: ChildService = ().serve(transport).await.map_err(|e| {
            let err = ChildError::initialization(&self.key, format!("MCP handshake failed: {e}"));
            error!(error = %err, "Child server handshake failed");
            err
        })?;

        let tools = match service.list_all_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                let err = ChildError::initialization(&self.key, format!("Failed to list tools: {e}"));
                error!(error = %err, "Child server catalog fetch failed");
                if let Err(join_err) = service.cancel().await {
                    warn!(error = %join_err, "Child session did not shut down cleanly");
                }
                return Err(err);
            }
        };

        state.update(|s| {
            s.status = ChildStatus::Ready;
            s.ready_at = Some(Utc::now());
        });

        info!(tool_count = tools.len(), "Child server ready");

        let peer = service.peer().clone();
        let cancel = service.cancellation_token();
        let stopping = Arc::new(AtomicBool::new(false));

        let monitor = tokio::spawn(monitor_session(
            self.key.clone(),
            service,
            state.clone(),
            Arc::clone(&stopping),
            self.crash_tx,
        ));

        Ok(ChildHandle {
            key: self.key,
            spec: self.spec,
            state,
            peer,
            tools,
            stopping,
            cancel: Some(cancel),
            monitor: Some(monitor),
        })
    }
}

/// Owns a ready child's session until it ends, then records why.
async fn monitor_session(
    key: String,
    service: ChildService,
    state: SharedState,
    stopping: Arc<AtomicBool>,
    crash_tx: UnboundedSender<CrashEvent>,
) {
    let outcome = service.waiting().await;

    if stopping.load(Ordering::SeqCst) {
        state.update(|s| s.status = ChildStatus::Stopped);
        debug!(server = %key, "Child session closed");
        return;
    }

    let reason = match outcome {
        Ok(quit) => format!("session ended: {quit:?}"),
        Err(e) => format!("session task failed: {e}"),
    };

    state.update(|s| {
        s.status = ChildStatus::Failed;
        s.last_error = Some(reason.clone());
    });

    warn!(server = %key, reason = %reason, "Child server crashed");

    // The fleet may already be gone during shutdown.
    let _ = crash_tx.send(CrashEvent { key, reason });
}

// ============================================================================
// Handle
// ============================================================================

/// A started child: its session, catalog and lifecycle state.
pub struct ChildHandle {
    key: String,
    spec: ChildSpec,
    state: SharedState,
    peer: Peer<RoleClient>,
    tools: Vec<Tool>,
    stopping: Arc<AtomicBool>,
    cancel: Option<RunningServiceCancellationToken>,
    monitor: Option<JoinHandle<()>>,
}

impl ChildHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spec(&self) -> &ChildSpec {
        &self.spec
    }

    pub fn status(&self) -> ChildStatus {
        self.state.snapshot().status
    }

    pub fn state(&self) -> ChildState {
        self.state.snapshot()
    }

    /// The catalog fetched when the child became ready.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// A connection for routing calls to this child.
    pub fn connection(&self) -> Arc<dyn ToolConnection> {
        Arc::new(self.peer.clone())
    }

    /// Close the session. Never fails; problems are only logged.
    ///
    /// A child that already crashed stays `FAILED`.
    #[instrument(skip_all, fields(server = %self.key))]
    pub async fn stop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }

        if let Some(mut monitor) = self.monitor.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut monitor).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Child monitor task failed"),
                Err(_) => {
                    warn!("Child server did not stop in time; abandoning it");
                    monitor.abort();
                }
            }
        }

        self.state.update(|s| {
            if s.status != ChildStatus::Failed {
                s.status = ChildStatus::Stopped;
            }
        });

        info!(status = %self.status(), "Child server stopped");
    }
}

impl Drop for ChildHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            self.stopping.store(true, Ordering::SeqCst);
            cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ChildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildHandle")
            .field("key", &self.key)
            .field("spec", &self.spec)
            .field("state", &self.state.snapshot())
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}
