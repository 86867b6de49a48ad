//! GoFitAI Backend
//!
//! AI generation service for workout plans, meal plans, recipes, food photo
//! analysis and coaching chat.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: Prompting, parsing, orchestration and rule-based fallback
//! - Providers: One client per AI vendor, with retry and backoff
//! - Repositories: Optional PostgreSQL persistence for workout plans

use anyhow::Result;
use gofitai_backend::{
    config::{self, ProviderCredentials},
    db,
    providers::ProviderRegistry,
    repositories::PgPlanRepository,
    routes,
    services::Orchestrator,
    state::AppState,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting GoFitAI Backend"
    );

    // Build provider clients from the environment
    let credentials = ProviderCredentials::from_env();
    let registry = ProviderRegistry::build(&config.ai, &credentials)?;
    info!(providers = ?registry.provider_names(), "Provider registry ready");

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config, &registry)?;
    }

    let orchestrator = Orchestrator::from_config(registry, &config.ai);

    // Metrics recorder (optional - the service runs without /metrics)
    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}. /metrics disabled.", e);
            None
        }
    };

    // Connect to the database (optional - plans are not persisted without it)
    let db_pool = db::connect_optional(&config.database).await;

    // Create application state
    let mut state = AppState::new(config.clone(), orchestrator);
    if let Some(pool) = db_pool {
        state = state
            .with_plan_store(Arc::new(PgPlanRepository::new(pool.clone())))
            .with_db(pool);
    }
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    // Build application
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "gofitai_backend=info,tower_http=info".into()
        } else {
            "gofitai_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig, registry: &ProviderRegistry) -> Result<()> {
    let mut errors = Vec::new();

    if registry.is_empty() {
        errors.push("At least one AI provider API key must be set");
    }
    if config.ai.max_attempts == 0 {
        errors.push("ai.max_attempts must be at least 1");
    }

    if !config.database.is_enabled() {
        warn!("No database configured - workout plans will not be persisted");
    } else if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
