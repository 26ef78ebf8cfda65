#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;

pub mod config;
mod impls;
mod tables;

use config::PostgresConfig;

/// The embedded schema migrations.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./schema");

/// PostgreSQL implementation of the vendor pricing repositories.
///
/// A thin wrapper over a single sqlx connection pool. Cloning is cheap
/// (the pool is reference-counted), so one `Db` is shared between the
/// HTTP handlers and the ingestion pipeline.
#[derive(Clone)]
pub struct Db {
    /// The shared connection pool
    pub pool: sqlx::PgPool,
}

impl Db {
    /// Open a connection pool to the configured database.
    ///
    /// When `config.run_migrations` is set (the default), all pending
    /// migrations in `schema/` are applied before returning.
    pub async fn open(config: &PostgresConfig) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::from_str(config.url())?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(database = %config.sanitized_url(), "connected to postgres");

        if config.run_migrations {
            MIGRATOR.run(&pool).await?;
        }

        Ok(Self { pool })
    }
}

impl vp_core::ports::Repository for Db {
    type Error = sqlx::Error;
}
