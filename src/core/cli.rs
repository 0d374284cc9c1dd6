//! Command-line interface.
//!
//! Every flag can also be set through the environment variable named next to
//! it; the command line wins when both are present.

use std::path::PathBuf;

use clap::Parser;

use crate::domains::tools::DEFAULT_SEPARATOR;

/// Aggregate several MCP servers behind one namespaced tool catalog.
#[derive(Debug, Clone, Parser)]
#[command(name = "mcp-aggregator", version, about)]
pub struct Cli {
    /// JSON file listing the child servers under `mcpServers`.
    #[arg(short, long, env = "MCP_AGGREGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Separator placed between a child key and its tool names.
    #[arg(short, long, env = "MCP_NAMESPACE_SEPARATOR", default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Enable diagnostics (forces the debug log level).
    #[arg(long, env = "MCP_DEBUG")]
    pub debug: bool,

    /// Log level filter.
    #[arg(long, env = "MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Write diagnostics to this file instead of stderr.
    #[arg(long, env = "MCP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Server name reported to the client.
    #[arg(long, env = "MCP_SERVER_NAME", default_value = "mcp-aggregator")]
    pub server_name: String,
}
