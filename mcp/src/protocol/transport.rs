//! Stdio transport for JSON-RPC messages
//!
//! Line-delimited JSON over stdin/stdout. The read loop never blocks on
//! handler execution: every payload is dispatched on its own task, and
//! responses funnel through a single writer so output lines never
//! interleave. Shutdown on EOF or cancellation.

use crate::server::McpServer;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Serve requests over stdio until EOF or cancellation.
pub async fn serve_stdio(server: Arc<McpServer>, cancel: CancellationToken) -> io::Result<()> {
    let mut reader = BufReader::new(io::stdin());
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            if stdout.flush().await.is_err() {
                break;
            }
        }
    });

    info!("MCP server listening on stdio");

    loop {
        let mut line = String::new();
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancellation requested, shutting down stdio transport");
                break;
            }
            read = reader.read_line(&mut line) => read?,
        };

        if read == 0 {
            info!("stdin closed, shutting down");
            break;
        }

        let payload = line.trim().to_string();
        if payload.is_empty() {
            continue;
        }

        debug!(bytes = payload.len(), "dispatching request");

        let server = server.clone();
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_payload(&payload, &cancel).await {
                let _ = tx.send(response.to_string()).await;
            }
        });
    }

    // Dropping the sender lets the writer drain in-flight responses.
    drop(tx);
    let _ = writer.await;
    Ok(())
}
