use super::config::{default_config_path, GovdashConfig, StoreBackend, StoreConfig};
use super::logging;
use govdash::api;
use govdash::crypto::EthereumVerifier;
use govdash::governance::GovernanceService;
use govdash::store::{InMemoryProposalStore, ProposalStore, SqliteProposalStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the governance API server
///
/// ## Configuration Loading
///
/// 1. `--config` flag if provided
/// 2. Default config at `<data_dir>/govdash/config.toml`
///
/// If the config file doesn't exist, a default one is generated.
/// `--bind` overrides `[server] bind`.
///
/// Serves until Ctrl-C, then drains in-flight requests.
pub async fn execute(
    config_path: Option<String>,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let config = if config_path.exists() {
        GovdashConfig::load(&config_path)?
    } else {
        GovdashConfig::create_default(&config_path)?;
        println!("Created default config: {}", config_path.display());
        GovdashConfig::load(&config_path)?
    };
    let settings = config.validate()?;

    logging::init(&config.logging)?;
    info!(config = %config_path.display(), "configuration loaded");

    let store = open_store(&config.store).await?;
    let service = GovernanceService::new(store, Arc::new(EthereumVerifier::new()), settings);
    info!(
        voting_delay = service.settings().voting_delay,
        voting_period = service.settings().voting_period,
        execution_window = ?service.settings().execution_window,
        network_id = ?service.settings().network_id,
        "governance service ready"
    );

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", bind, e))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, api::router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn open_store(
    config: &StoreConfig,
) -> Result<Arc<dyn ProposalStore>, Box<dyn std::error::Error>> {
    match (config.backend, &config.path) {
        (StoreBackend::Memory, _) => {
            warn!("using in-memory store; proposals are lost on restart");
            Ok(Arc::new(InMemoryProposalStore::new()))
        }
        (StoreBackend::Sqlite, Some(path)) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create store directory: {}", e))?;
            }
            let store = SqliteProposalStore::open(path)
                .await
                .map_err(|e| format!("Failed to open store '{}': {}", path.display(), e))?;
            info!(path = %path.display(), "opened sqlite store");
            Ok(Arc::new(store))
        }
        (StoreBackend::Sqlite, None) => {
            Err("store.path is required when store.backend = \"sqlite\"".into())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
