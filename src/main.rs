//! Ledgerdesk server entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use ledgerdesk::{create_rest_router, Authenticator, Config, MemoryStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ledgerdesk: back-office server with ownership-scoped access control
#[derive(Parser, Debug)]
#[command(name = "ledgerdesk")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default behavior)
    Serve {
        /// HTTP port. If not specified, uses the config file value.
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable JSON logging format
        #[arg(long)]
        json_logs: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (port, json_logs) = match args.command {
        Some(Command::Serve { port, json_logs }) => (port, json_logs),
        None => (None, false),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Ledgerdesk v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    if let Some(p) = port {
        config.server.http_port = p;
    }

    tracing::info!(
        bind = %config.bind_addr(),
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryStore::new());
    let authenticator = Authenticator::new(config.auth.clone());
    let router = create_rest_router(store, authenticator, &config.api);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
