//! STDIO transport implementation.
//!
//! Serves the aggregated catalog on stdin/stdout. Diagnostics must never be
//! written to stdout while this transport is active.

use rmcp::ServiceExt;
use rmcp::service::QuitReason;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::AggregatorServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve `server` on stdin/stdout until the client disconnects.
    pub async fn run(server: AggregatorServer) -> TransportResult<QuitReason> {
        info!("Ready - communicating via stdin/stdout");
        let reason = Self::serve(server, rmcp::transport::stdio()).await?;
        info!(reason = ?reason, "STDIO transport finished");
        Ok(reason)
    }

    /// Serve `server` on any read/write pair.
    pub async fn serve<R, W>(server: AggregatorServer, io: (R, W)) -> TransportResult<QuitReason>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let service = server
            .serve(io)
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))
    }
}
