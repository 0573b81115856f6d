//! sportsdb-mcp: TheSportsDB tools for MCP clients.
//!
//! Two subcommands:
//! - `sportsdb-mcp stdio` (default): STDIO transport for Claude Desktop and other STDIO-based MCP clients
//! - `sportsdb-mcp serve`: Streamable HTTP MCP server exposing the same tools

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use sportsdb_mcp::{SportsDbConfig, SportsDbMcpServer, SportsDbRegistry};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as TowerServiceExt;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE_NAME: &str = "sportsdb.toml";

/// sportsdb-mcp: TheSportsDB tools for MCP clients.
#[derive(Parser)]
#[command(
    name = "sportsdb-mcp",
    version,
    about = "sportsdb-mcp: TheSportsDB v1 API exposed as MCP tools"
)]
struct Cli {
    /// Path to sportsdb.toml [default: ./sportsdb.toml or ~/.config/sportsdb-mcp/sportsdb.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over STDIO (default)
    Stdio,
    /// Start a Streamable HTTP MCP server exposing the tools
    Serve {
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP stream, so logs go to stderr (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down sportsdb-mcp...");
        cancel_for_signal.cancel();
    });

    let config = load_config(resolve_config(cli.config)?.as_deref()).await?;
    let registry = SportsDbRegistry::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build TheSportsDB client: {}", e))?;
    let server = SportsDbMcpServer::new(registry);

    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => run_stdio(server, cancel).await?,
        Commands::Serve { port, host } => run_serve(server, host, port, cancel).await?,
    }

    Ok(())
}

/// Serve the tools over stdin/stdout using rmcp's serve_with_ct.
async fn run_stdio(server: SportsDbMcpServer, cancel: CancellationToken) -> Result<()> {
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve_with_ct(transport, cancel.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize stdio transport: {:?}", e))?;

    tracing::info!("sportsdb-mcp stdio transport initialized, waiting for messages");

    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => {
                    tracing::info!(?reason, "stdio transport completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "stdio transport error");
                    return Err(anyhow::anyhow!("stdio transport error: {}", e));
                }
            }
        }
        _ = cancel.cancelled() => {
            tracing::info!("stdio transport cancelled");
        }
    }

    Ok(())
}

/// Serve the tools over Streamable HTTP; every session shares one registry.
async fn run_serve(
    server: SportsDbMcpServer,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<()> {
    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        cancellation_token: cancel.clone(),
        ..Default::default()
    };
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        session_manager,
        http_config,
    );

    let app = Router::new().fallback(move |req: Request<axum::body::Body>| {
        let svc = mcp_service.clone();
        async move {
            match svc.oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(e) => {
                    tracing::error!(error = ?e, "MCP HTTP service error");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "sportsdb-mcp HTTP server listening");
    tracing::info!("Connect your MCP client to http://{}:{}/mcp", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    tracing::info!("sportsdb-mcp HTTP server stopped");
    Ok(())
}

/// Resolve the config file path: explicit flag → ./sportsdb.toml → ~/.config/sportsdb-mcp/sportsdb.toml.
///
/// Unlike an explicit `--config`, the default locations are optional.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file {:?} does not exist", path));
        }
        return Ok(Some(path));
    }

    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join("sportsdb-mcp").join(CONFIG_FILE_NAME);
        if xdg.exists() {
            return Ok(Some(xdg));
        }
    }

    Ok(None)
}

/// Build the effective config: defaults, then the file (if any), then env overrides.
async fn load_config(path: Option<&Path>) -> Result<SportsDbConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config file");
            SportsDbConfig::load(path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to load config {:?}: {}", path, e))?
        }
        None => SportsDbConfig::default(),
    };
    config.apply_env_overrides();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}
