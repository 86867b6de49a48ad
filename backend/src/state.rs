//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction. It is built once
//! at startup and read-only afterwards.

use crate::config::AppConfig;
use crate::repositories::PlanStore;
use crate::services::Orchestrator;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
///
/// All fields are `Arc`s or internally reference counted, so cloning per
/// request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Provider walk with fallback
    pub orchestrator: Arc<Orchestrator>,
    /// Plan persistence, absent when no database is configured
    pub plans: Option<Arc<dyn PlanStore>>,
    /// Database pool, used by the readiness check
    pub db: Option<PgPool>,
    /// Prometheus exporter handle for `/metrics`
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            plans: None,
            db: None,
            metrics: None,
        }
    }

    pub fn with_plan_store(mut self, plans: Arc<dyn PlanStore>) -> Self {
        self.plans = Some(plans);
        self
    }

    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    #[inline]
    pub fn plans(&self) -> Option<&dyn PlanStore> {
        self.plans.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderRegistry;

    #[test]
    fn test_state_clone_shares_orchestrator() {
        let config = AppConfig::default();
        let orchestrator = Orchestrator::from_config(ProviderRegistry::default(), &config.ai);
        let state = AppState::new(config, orchestrator);

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.orchestrator, &cloned.orchestrator));
        assert!(cloned.plans().is_none());
        assert!(cloned.db.is_none());
    }
}
