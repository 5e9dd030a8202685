//! Vault Engine Binary
//!
//! Serves one options vault over HTTP in paper mode, with simulated
//! derivatives protocol, auction venue and strike selector.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin vault-engine
//! ```
//!
//! # Environment Variables
//!
//! - `VAULT_ENGINE_CONFIG`: Path to the YAML config (default: config.yaml; defaults apply when absent)
//! - `RUST_LOG`: Log filter, overrides `observability.logging.level`

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use vault_engine::application::ports::SystemClock;
use vault_engine::application::services::VaultService;
use vault_engine::config::{Config, load_config, load_config_from_string};
use vault_engine::domain::vault::Vault;
use vault_engine::infrastructure::auction::SimulatedAuction;
use vault_engine::infrastructure::http::{AppState, create_router};
use vault_engine::infrastructure::messaging::TracingEventPublisher;
use vault_engine::infrastructure::protocol::SimulatedDerivativesProtocol;
use vault_engine::infrastructure::strike_selection::ManualStrikeSelector;
use vault_engine::telemetry::init_tracing;

/// Default config path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Concrete facade wired with the paper-mode adapters.
type PaperVaultService = VaultService<
    SimulatedDerivativesProtocol,
    SimulatedAuction,
    ManualStrikeSelector,
    SystemClock,
    TracingEventPublisher,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = read_config()?;
    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;

    tracing::info!(
        asset = %config.vault.asset,
        underlying = %config.vault.underlying,
        is_put = config.vault.is_put,
        "Starting Vault Engine (paper mode)"
    );

    let service = Arc::new(build_service(&config)?);
    let app = create_router(AppState {
        service,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let http_addr: SocketAddr = config
        .server
        .listen_address()
        .parse()
        .context("invalid server address")?;
    let listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    tracing::info!(%http_addr, "HTTP server starting");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Vault Engine stopped");
    Ok(())
}

/// Load the config file, or defaults when it does not exist.
fn read_config() -> anyhow::Result<Config> {
    let path =
        std::env::var("VAULT_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_config(Some(&path)).with_context(|| format!("failed to load config from {path}"))
    } else {
        load_config_from_string("").context("default config is invalid")
    }
}

fn build_service(config: &Config) -> anyhow::Result<PaperVaultService> {
    let params = config.vault_params()?;
    let vault = Vault::new(params).context("invalid vault parameters")?;

    let protocol = Arc::new(SimulatedDerivativesProtocol::new(config.vault.decimals));
    if let Some(price) = config.simulation.expiry_price {
        protocol.set_expiry_price(price);
    }

    Ok(VaultService::new(
        vault,
        protocol,
        Arc::new(SimulatedAuction::new(config.simulation.fill_ratio)),
        Arc::new(ManualStrikeSelector::new(
            config.simulation.strike,
            config.simulation.premium,
        )),
        Arc::new(SystemClock),
        Arc::new(TracingEventPublisher),
        config.rollover_settings(),
    ))
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
