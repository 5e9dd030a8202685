//! Configuration loading for the vault engine.
//!
//! YAML with `${VAR}` / `${VAR:-default}` environment interpolation. Every
//! field has a default, so an empty document is a valid paper-mode config.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vault_engine::config::load_config;
//!
//! let config = load_config(Some("config.yaml"))?;
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod observability;
mod rollover;
mod server;
mod simulation;
mod vault;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LoggingConfig, ObservabilityConfig};
pub use rollover::RolloverConfig;
pub use server::ServerConfig;
pub use simulation::SimulationConfig;
pub use vault::{VaultConfig, to_base_units};

use crate::application::use_cases::RolloverSettings;
use crate::domain::vault::VaultParams;
use crate::domain::vault::aggregate::MIN_AUCTION_DURATION_SECS;
use crate::domain::vault::services::ShareMath;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Vault parameters.
    #[serde(default)]
    pub vault: VaultConfig,
    /// Rollover timing and auction pricing.
    #[serde(default)]
    pub rollover: RolloverConfig,
    /// Simulated collaborators.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parameters for the vault aggregate.
    pub fn vault_params(&self) -> Result<VaultParams, ConfigError> {
        self.vault.to_params(&self.rollover)
    }

    /// Settings for the rollover use cases.
    #[must_use]
    pub const fn rollover_settings(&self) -> RolloverSettings {
        RolloverSettings {
            delay_secs: self.rollover.delay_secs,
        }
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to `config.yaml`.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a constant pattern
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values, reporting every problem at once.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if config.server.http_port == 0 {
        problems.push("server.http_port must be non-zero".to_string());
    }

    let vault = &config.vault;
    if vault.asset.trim().is_empty() {
        problems.push("vault.asset must not be empty".to_string());
    }
    if ShareMath::unit(vault.decimals).is_err() {
        problems.push(format!("vault.decimals must be at most 18, got {}", vault.decimals));
    }
    if vault.cap <= Decimal::ZERO {
        problems.push("vault.cap must be positive".to_string());
    }
    for (field, account) in [
        ("owner", &vault.owner),
        ("keeper", &vault.keeper),
        ("fee_recipient", &vault.fee_recipient),
    ] {
        if account.trim().is_empty() {
            problems.push(format!("vault.{field} must not be empty"));
        }
    }

    if config.rollover.auction_duration_secs < MIN_AUCTION_DURATION_SECS {
        problems.push(format!(
            "rollover.auction_duration_secs must be at least {MIN_AUCTION_DURATION_SECS}"
        ));
    }

    let simulation = &config.simulation;
    if simulation.strike <= Decimal::ZERO {
        problems.push("simulation.strike must be positive".to_string());
    }
    if simulation.premium <= Decimal::ZERO {
        problems.push("simulation.premium must be positive".to_string());
    }
    if simulation.fill_ratio < Decimal::ZERO || simulation.fill_ratio > Decimal::ONE {
        problems.push("simulation.fill_ratio must be between 0 and 1".to_string());
    }
    if simulation.expiry_price.is_some_and(|p| p <= Decimal::ZERO) {
        problems.push("simulation.expiry_price must be positive".to_string());
    }

    let format = config.observability.logging.format.as_str();
    if !LoggingConfig::FORMATS.contains(&format) {
        problems.push(format!(
            "observability.logging.format must be one of: {:?}",
            LoggingConfig::FORMATS
        ));
    }

    // Amount and rate conversions carry their own range checks.
    if problems.is_empty() {
        if let Err(ConfigError::ValidationError(message)) = config.vault_params() {
            problems.push(message);
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(problems.join("; ")))
    }
}
