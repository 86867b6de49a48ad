//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness check (checks dependencies)
//! - /health/live - Liveness check (always returns OK if server is running)

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub providers: CheckStatus,
    /// Provider names available to the orchestrator
    pub configured_providers: Vec<String>,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn new(status: &str, message: Option<String>) -> Self {
        Self {
            status: status.to_string(),
            message,
        }
    }
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Readiness check - checks if the service is ready to accept traffic
///
/// Returns 503 only when a configured database is unreachable. Running
/// without providers is degraded but still serves rule-based plans.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = match &state.db {
        Some(pool) => match db::health_check(pool).await {
            Ok(_) => CheckStatus::new("healthy", None),
            Err(e) => CheckStatus::new("unhealthy", Some(e.to_string())),
        },
        None => CheckStatus::new("disabled", None),
    };

    let configured_providers = state.orchestrator().registry().provider_names();
    let provider_check = if configured_providers.is_empty() {
        CheckStatus::new("degraded", Some("No AI providers configured".to_string()))
    } else {
        CheckStatus::new("healthy", None)
    };

    let is_healthy = db_check.status != "unhealthy";

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(HealthChecks {
            database: db_check,
            providers: provider_check,
            configured_providers,
        }),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness check - checks if the service is alive
/// Always returns OK if the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::providers::ProviderRegistry;
    use crate::services::Orchestrator;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[tokio::test]
    async fn test_readiness_without_database_or_providers() {
        let config = AppConfig::default();
        let orchestrator = Orchestrator::from_config(ProviderRegistry::default(), &config.ai);
        let state = AppState::new(config, orchestrator);

        let Ok(Json(response)) = readiness_check(State(state)).await else {
            panic!("readiness should pass without a database");
        };
        assert_eq!(response.status, "ready");
        let checks = response.checks.unwrap();
        assert_eq!(checks.database.status, "disabled");
        assert_eq!(checks.providers.status, "degraded");
        assert!(checks.configured_providers.is_empty());
    }
}
