//! Application configuration management.
//!
//! This module handles loading and merging configuration from multiple sources
//! with a clear precedence order. Configuration can come from default values,
//! configuration files, and environment variables.

use crate::{Cli, schedule::Scheduler};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive as _;
use serde::{Deserialize, Serialize};

/// Pricing policy knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    /// Gross margin the auto-price rule targets, as a fraction in `[0, 1)`
    #[serde(default = "default_target_margin")]
    pub target_margin: f64,
}

fn default_target_margin() -> f64 {
    0.30
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            target_margin: default_target_margin(),
        }
    }
}

impl PricingConfig {
    /// The target margin as an exact decimal (zero when the configured
    /// float is not representable).
    pub fn margin(&self) -> Decimal {
        Decimal::from_f64(self.target_margin).unwrap_or(Decimal::ZERO)
    }
}

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, pagination limits)
    #[serde(default)]
    pub server: vp_axum::config::AxumConfig,

    /// Database configuration (connection URL, pool settings)
    #[serde(default)]
    pub database: vp_postgres::config::PostgresConfig,

    /// Graph mailbox configuration (credentials, mailbox user, download dir)
    #[serde(default)]
    pub graph: vp_ingest::GraphConfig,

    /// Pricing policy configuration
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Ingestion cycle scheduling configuration
    #[serde(default)]
    pub schedule: Scheduler,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern:
    /// `APP_<SECTION>__<KEY>` maps to `<section>.<key>`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Set database URL via environment variable
    /// export APP_DATABASE__URL="postgres://db.internal:5432/pricing"
    ///
    /// # Set server bind address
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    ///
    /// # Run an ingestion cycle every day
    /// export APP_SCHEDULE__EVERY="1day"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&Self::default())?);

        // Layer on config file if it is specified and exists
        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // Override with environment variables
        // This maps APP_SERVER__BIND_ADDRESS to server.bind_address
        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
