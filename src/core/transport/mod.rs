//! Transport layer for the aggregator.
//!
//! The aggregator is itself an MCP server and speaks to its client over
//! standard input/output, the same transport it uses towards its children.

mod error;
pub mod stdio;

pub use error::{TransportError, TransportResult};
pub use stdio::StdioTransport;
