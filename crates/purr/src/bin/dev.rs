//! `purr-dev`: run the API locally over HTTP.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};

use purr::config::{Config, LogFormat};
use purr::local::create_app;
use purr::state::AppState;
use purr::storage::InMemoryRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Store {
    /// Ephemeral in-process store
    Memory,
    /// DynamoDB, or DynamoDB Local through AWS_ENDPOINT_URL
    Dynamodb,
}

/// Purr - well data API, served locally
#[derive(Parser, Debug)]
#[command(name = "purr-dev")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "127.0.0.1", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3001", env = "PORT")]
    port: u16,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = Store::Memory, env = "PURR_STORE")]
    store: Store,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    purr::telemetry::init(config.log_format.unwrap_or(LogFormat::Pretty));

    let state = match cli.store {
        Store::Memory => AppState::in_memory(InMemoryRepository::new(), &config),
        Store::Dynamodb => dynamodb_state(&config).await?,
    };

    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => TcpListener::bind((cli.host.as_str(), cli.port)).await?,
    };

    tracing::info!(store = ?cli.store, "listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "dynamodb")]
async fn dynamodb_state(config: &Config) -> Result<AppState> {
    Ok(AppState::dynamodb(config).await?)
}

#[cfg(not(feature = "dynamodb"))]
async fn dynamodb_state(_config: &Config) -> Result<AppState> {
    anyhow::bail!("purr-dev was built without the dynamodb feature")
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
