//! Database connection and pool management
//!
//! The database only stores generated workout plans, so it is optional: with
//! no URL configured the service runs without persistence.

use crate::config::DatabaseConfig;
use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning
pub struct PoolSettings {
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Create a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let settings = PoolSettings::default();
    let connect_options =
        PgConnectOptions::from_str(database_url)?.application_name("gofitai-backend");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(settings.min_connections.min(max_connections))
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await?;

    info!(max = max_connections, "Database pool created");
    Ok(pool)
}

/// Connect and migrate when a database is configured.
///
/// Connection failures disable persistence instead of aborting startup.
pub async fn connect_optional(config: &DatabaseConfig) -> Option<PgPool> {
    if !config.is_enabled() {
        info!("No database configured, generated plans will not be persisted");
        return None;
    }

    let pool = match create_pool(&config.url, config.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "Database unavailable, persistence disabled");
            return None;
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        warn!(error = %e, "Database migrations failed, persistence disabled");
        return None;
    }
    Some(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!("Database health check failed: {}", e);
            e.into()
        })
}
