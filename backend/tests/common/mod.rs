//! Common test utilities for integration tests
//!
//! Builds the full router with scripted providers and an in-memory plan
//! store, so no network or database is needed.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gofitai_backend::{
    config::AppConfig,
    providers::{ProviderClient, ProviderError, ProviderRegistry, ProviderRequest, RawResult, RetryPolicy},
    repositories::PlanStore,
    routes,
    services::Orchestrator,
    state::AppState,
};
use gofitai_shared::{Subject, WorkoutPlan};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

/// Provider that replays canned replies, then keeps failing
pub struct ScriptedProvider {
    name: &'static str,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Provider whose every call is rejected as a bad request
    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::new(name, Vec::new())
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn supports(&self, _subject: Subject) -> bool {
        true
    }

    async fn call(&self, request: &ProviderRequest, _timeout: Duration) -> Result<RawResult, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Err(
            ProviderError::Transport {
                status: Some(400),
                message: "scripted failure".to_string(),
            },
        ));
        next.map(|text| RawResult {
            text,
            model: "scripted-model".to_string(),
        })
    }
}

/// Plan store that keeps saved plans in memory
#[derive(Default)]
pub struct MemoryPlanStore {
    pub saved: Mutex<Vec<(Uuid, WorkoutPlan, String)>>,
    pub fail: bool,
}

impl MemoryPlanStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn upsert_workout_plan(&self, user_id: Uuid, plan: &WorkoutPlan, source: &str) -> Result<Uuid> {
        if self.fail {
            anyhow::bail!("database unavailable");
        }
        self.saved
            .lock()
            .unwrap()
            .push((user_id, plan.clone(), source.to_string()));
        Ok(Uuid::new_v4())
    }
}

pub const MULTIPART_BOUNDARY: &str = "gofitai-test-boundary";

/// A `multipart/form-data` body; each part is (name, content type, bytes)
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        match content_type {
            Some(ct) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\nContent-Type: {}\r\n\r\n",
                    name, ct
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub plans: Option<Arc<MemoryPlanStore>>,
}

impl TestApp {
    /// Application with no providers configured: every request uses the fallback
    pub fn new() -> Self {
        Self::build(ProviderRegistry::default(), None)
    }

    /// Application whose providers for `subject` are the given clients
    pub fn with_providers(subject: Subject, providers: Vec<Arc<ScriptedProvider>>) -> Self {
        let providers: Vec<Arc<dyn ProviderClient>> = providers
            .into_iter()
            .map(|p| p as Arc<dyn ProviderClient>)
            .collect();
        Self::build(ProviderRegistry::default().with_providers(subject, providers), None)
    }

    /// Application that persists workout plans in `store`
    pub fn with_plan_store(registry: ProviderRegistry, store: Arc<MemoryPlanStore>) -> Self {
        Self::build(registry, Some(store))
    }

    fn build(registry: ProviderRegistry, plans: Option<Arc<MemoryPlanStore>>) -> Self {
        let config = AppConfig::default();
        let policy = RetryPolicy {
            max_jitter_ms: 0,
            ..RetryPolicy::default()
        };
        let orchestrator = Orchestrator::new(
            registry,
            policy,
            config.ai.complex_timeout(),
            config.ai.simple_timeout(),
        );

        let mut state = AppState::new(config, orchestrator);
        if let Some(store) = &plans {
            state = state.with_plan_store(store.clone());
        }
        let app = routes::create_router(state);

        Self { app, plans }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// POST a raw body with the given content type, parsing the reply as JSON
    pub async fn post_bytes(
        &self,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();

        let (status, body) = self.send(request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    /// POST and parse the response body as JSON
    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.post(path, &body.to_string()).await;
        let json = serde_json::from_str(&body)
            .unwrap_or_else(|e| panic!("response is not JSON ({}): {}", e, body));
        (status, json)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }
}
