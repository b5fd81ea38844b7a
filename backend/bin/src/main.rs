//! ComputerChan Backend Binary
//!
//! Serves the wallet login and holder profile API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "mocks")]
use computerchan_backend_lib::data::ownership::MockOwnership;
use computerchan_backend_lib::{
    api::create_app,
    config::{Config, LogFormat},
    data::{
        ownership::{OwnershipSource, PostgresOwnership},
        storage::{BoxedStorageWrapper, InMemoryStorage},
    },
    log::initialize_logging,
    services::Services,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "computerchan-backend")]
#[command(about = "ComputerChan wallet login backend", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override indexer database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log output format: auto, json or text
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    initialize_logging(config.log_format);

    info!("Starting ComputerChan Backend");
    info!("Server will run on {}:{}", config.host, config.port);

    let storage = Arc::new(BoxedStorageWrapper::new(InMemoryStorage::new()));
    let ownership = create_ownership_source(&config).await?;
    let services =
        Services::new(&config, storage, ownership).context("Invalid service configuration")?;

    let shutdown = CancellationToken::new();
    let sweeper = services.nonces.clone().spawn_expiry_sweeper(
        Duration::from_secs(config.auth.nonce_sweep_interval_seconds.max(1)),
        shutdown.clone(),
    );

    // Start server
    let app = create_app(services);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .context("Failed to bind TCP listener")?;

    info!("Server listening on http://{}:{}", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    shutdown.cancel();
    sweeper.await.context("Nonce sweeper panicked")?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
        }
        _ = shutdown.cancelled() => {}
    }
}

fn load_config() -> Result<Config> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?,
        None => {
            debug!("No config file specified, using defaults");
            Config::default()
        }
    };

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.ownership.database_url = database_url;
    }
    if let Some(log_format) = args.log_format {
        config.log_format = log_format;
    }

    Ok(config)
}

async fn create_ownership_source(config: &Config) -> Result<Arc<dyn OwnershipSource>> {
    #[cfg(feature = "mocks")]
    {
        if config.ownership.mock_mode {
            use computerchan_backend_lib::constants::mocks::{MOCK_ADDRESS, MOCK_TOKENS};

            info!("Using mock ownership source (mock_mode enabled)");
            return Ok(Arc::new(
                MockOwnership::new().with_tokens(MOCK_ADDRESS, MOCK_TOKENS),
            ));
        }
    }

    let ownership = PostgresOwnership::new(&config.ownership)
        .context("Invalid ownership configuration")?;

    // the indexer may come up later, lookups report it as unavailable meanwhile
    match ownership.test_connection().await {
        Ok(()) => info!("Connected to indexer database"),
        Err(e) => warn!(error = %e, "Indexer database not reachable yet"),
    }

    Ok(Arc::new(ownership))
}
