//! MCP Aggregator Library
//!
//! This crate runs several child MCP servers as subprocesses and presents
//! them to a single client as one MCP server. Every child tool is announced
//! as `<child key><separator><tool name>` and calls are routed back to the
//! child that owns the tool.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the server handler and its lifecycle
//! - **domains**: business logic organized by bounded contexts
//!   - **children**: command resolution, per-child supervision and the fleet
//!   - **tools**: namespacing, the capability registry and the router
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_aggregator::core::{Aggregator, Config, StdioTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let aggregator = Aggregator::start(Config::new()).await?;
//!     StdioTransport::run(aggregator.server()).await?;
//!     aggregator.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Aggregator, AggregatorServer, Config, Error, Result};
