//! Children domain module.
//!
//! This module spawns and supervises the child MCP servers the aggregator
//! fronts. Each child is a subprocess speaking MCP over its stdin/stdout.
//!
//! ## Architecture
//!
//! - `spec.rs` - Static launch specifications (`ChildSpec`, `FleetSpec`)
//! - `resolver.rs` - Maps a configured command to the executable spawned
//! - `supervisor.rs` - Spawn, handshake, readiness and crash detection for one child
//! - `fleet.rs` - Fail-fast startup, crash draining and shutdown of all children
//! - `error.rs` - Lifecycle error types

mod error;
pub mod fleet;
pub mod resolver;
mod spec;
pub mod supervisor;

pub use error::{ChildError, ChildPhase};
pub use fleet::{ChildFleet, ChildReport};
pub use resolver::{CommandResolver, RuntimeToolchain};
pub use spec::{ChildSpec, FleetSpec};
pub use supervisor::{ChildHandle, ChildState, ChildStatus, ChildSupervisor, CrashEvent};
