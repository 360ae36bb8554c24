//! pubdex entrypoint: transport selection and server bootstrap

use anyhow::{Context, Result};
use clap::Parser;
use pubdex_config::TransportKind;
use pubdex_mcp::{McpServer, ServerConfig, ToolContext};
use pubdex_registry::PubDevClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pubdex - Model Context Protocol server for the pub.dev registry
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Serve over line-delimited stdio (default)
    #[clap(long, conflicts_with = "http")]
    stdio: bool,

    /// Serve over HTTP
    #[clap(long)]
    http: bool,

    /// Address for the HTTP transport
    #[clap(long, default_value = "127.0.0.1:8080")]
    http_addr: SocketAddr,

    /// Path to a JSON configuration file
    #[clap(long, env = "PUBDEX_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    /// Flags win over `MCP_TRANSPORT`; stdio is the default.
    fn transport(&self) -> Result<TransportKind> {
        if self.http {
            return Ok(TransportKind::Http);
        }
        if self.stdio {
            return Ok(TransportKind::Stdio);
        }
        match std::env::var("MCP_TRANSPORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("MCP_TRANSPORT={value}")),
            Err(_) => Ok(TransportKind::Stdio),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = pubdex_config::load(args.config.as_deref())
        .context("failed to load configuration")?;

    // Logs go to stderr: stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.telemetry.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    if settings.telemetry.exporter != pubdex_config::TelemetryExporter::None {
        info!(
            exporter = ?settings.telemetry.exporter,
            "telemetry exporter selected; exporter wiring is provided by the host"
        );
    }

    let transport = args.transport()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(run(args, transport, settings))
}

async fn run(
    args: Args,
    transport: TransportKind,
    settings: pubdex_config::Settings,
) -> Result<()> {
    let client = PubDevClient::from_settings(&settings)
        .context("failed to construct registry client")?;
    let context = Arc::new(ToolContext::new(Arc::new(client), settings));
    let server = Arc::new(McpServer::new(context, ServerConfig::default()));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal_cancel.cancel();
        }
    });

    match transport {
        TransportKind::Stdio => {
            pubdex_mcp::serve_stdio(server, cancel)
                .await
                .context("stdio transport failed")?;
        }
        TransportKind::Http => {
            pubdex_mcp::serve_http(server, args.http_addr, cancel)
                .await
                .with_context(|| format!("http transport failed on {}", args.http_addr))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transport_is_stdio() {
        let args = Args::parse_from(["pubdex"]);
        // Only meaningful when MCP_TRANSPORT is unset in the test env.
        if std::env::var("MCP_TRANSPORT").is_err() {
            assert_eq!(args.transport().unwrap(), TransportKind::Stdio);
        }
    }

    #[test]
    fn test_http_flag_selects_http() {
        let args = Args::parse_from(["pubdex", "--http"]);
        assert_eq!(args.transport().unwrap(), TransportKind::Http);
    }

    #[test]
    fn test_flags_conflict() {
        assert!(Args::try_parse_from(["pubdex", "--stdio", "--http"]).is_err());
    }
}
