//! Client construction
//!
//! Builds a configured, not-yet-connected client from a connection
//! descriptor. Building never fails on the descriptor's contents: the URL is
//! only checked when the pool is first needed, so a malformed value surfaces
//! when the schema sync authenticates.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

use crate::config::{ClientOptions, ConnectionConfig};
use crate::error::Result;
use crate::models::{Model, ModelRegistry};

/// Handle to a configured Postgres client and the models defined on it
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    /// `None` when `url` does not parse
    pool: Option<PgPool>,
    options: ClientOptions,
    models: ModelRegistry,
}

/// Build a client with default options
pub fn build_connection(config: &ConnectionConfig) -> Result<Client> {
    build_connection_with(config, ClientOptions::default())
}

/// Build a client from a descriptor and explicit options
pub fn build_connection_with(config: &ConnectionConfig, options: ClientOptions) -> Result<Client> {
    Client::new(&config.connection_string(), options)
}

impl Client {
    /// Create a client for `url`; must be called within a tokio runtime
    pub fn new(url: &str, options: ClientOptions) -> Result<Self> {
        let pool = match url.parse::<PgConnectOptions>() {
            Ok(connect_options) => Some(
                PgPoolOptions::new()
                    .max_connections(options.max_connections)
                    .acquire_timeout(Duration::from_secs(options.acquire_timeout_secs))
                    .connect_lazy_with(connect_options),
            ),
            Err(e) => {
                tracing::debug!(error = %e, "Connection string does not parse; deferring the error");
                None
            }
        };

        Ok(Self {
            url: url.to_string(),
            pool,
            options,
            models: ModelRegistry::new(),
        })
    }

    /// Register a model so the schema sync maps it to a table
    pub fn define(&mut self, model: Model) -> Result<()> {
        self.models.define(model)
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The connection pool, or the error parsing the connection string
    pub fn pool(&self) -> std::result::Result<&PgPool, sqlx::Error> {
        match &self.pool {
            Some(pool) => Ok(pool),
            None => Err(match self.url.parse::<PgConnectOptions>() {
                Err(e) => e,
                Ok(_) => sqlx::Error::PoolClosed,
            }),
        }
    }

    /// Execute a single SQL statement
    pub async fn execute(&self, sql: &str) -> std::result::Result<(), sqlx::Error> {
        if self.options.logging {
            tracing::debug!(sql = sql, "Executing statement");
        }

        sqlx::query(sql).execute(self.pool()?).await?;
        Ok(())
    }

    /// Close the pool; pending connections are dropped
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
