use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use dsm_client::{ApiClient, FileStation, SessionManager};
use dsm_mcp_server::shutdown::spawn_signal_listener;
use dsm_mcp_server::{Cli, McpServer, ToolExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let config = Cli::parse().into_config();
    config.validate().context("invalid configuration")?;

    let session = Arc::new(SessionManager::new(ApiClient::new(&config)?, &config));
    session
        .login()
        .await
        .with_context(|| format!("initial login to {} failed", config.base_url))?;
    tracing::info!(account = %config.account, "Logged in to DSM");

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone()).context("failed to install signal handlers")?;

    let files = FileStation::new(session.clone(), &config);
    let server = McpServer::new(ToolExecutor::new(files, shutdown.clone()));

    let served = server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &shutdown)
        .await;

    // Stops the signal listener.
    shutdown.cancel();
    session.logout().await;
    served.context("stdio transport failed")
}
