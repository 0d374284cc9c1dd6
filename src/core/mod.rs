//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the aggregator:
//! error handling, configuration, logging, the client-facing server with its
//! lifecycle, and the transport layer.

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod transport;

pub use aggregator::Aggregator;
pub use cli::Cli;
pub use config::Config;
pub use error::{Error, Result};
pub use server::AggregatorServer;
pub use transport::{StdioTransport, TransportError};
