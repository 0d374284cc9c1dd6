//! Tools domain module.
//!
//! This module owns the aggregated tool catalog: how child tools are named,
//! stored and routed back to the child that implements them.
//!
//! ## Architecture
//!
//! - `namespace.rs` - Separator validation, building and splitting names
//! - `connection.rs` - The `ToolConnection` seam over a child session
//! - `registry.rs` - The namespaced catalog of every live child's tools
//! - `router.rs` - `tools/list` and `tools/call` dispatch
//! - `error.rs` - Tool-specific error types

mod connection;
mod error;
pub mod namespace;
mod registry;
pub mod router;

pub use connection::{ForwardError, ToolConnection};
pub use error::ToolError;
pub use namespace::{DEFAULT_SEPARATOR, Separator};
pub use registry::{CapabilityRegistry, RegistryEntry};
pub use router::NamespaceRouter;

#[cfg(test)]
pub(crate) mod test_support;
