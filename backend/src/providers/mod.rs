//! AI provider clients
//!
//! Each client performs exactly one HTTP call per [`ProviderClient::call`] and
//! classifies the failure. Retrying lives in [`retry`], ordering and fallback
//! in the orchestrator service.

use async_trait::async_trait;
use gofitai_shared::{ImageInput, Subject};
use std::time::Duration;

pub mod cloudflare;
pub mod deepseek;
pub mod error;
pub mod gemini;
pub mod registry;
pub mod retry;

pub use cloudflare::CloudflareClient;
pub use deepseek::DeepSeekClient;
pub use error::{AttemptOutcome, ProviderError};
pub use gemini::GeminiClient;
pub use registry::ProviderRegistry;
pub use retry::{with_retry, RetryOutcome, RetryPolicy};

/// Input to one provider call
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub subject: Subject,
    pub prompt: String,
    pub image: Option<ImageInput>,
    /// Ask the provider for a JSON-only reply where it supports that
    pub json_mode: bool,
}

impl ProviderRequest {
    pub fn new(subject: Subject, prompt: impl Into<String>) -> Self {
        Self {
            subject,
            prompt: prompt.into(),
            image: None,
            json_mode: subject.expects_json(),
        }
    }

    pub fn with_image(mut self, image: Option<ImageInput>) -> Self {
        self.image = image;
        self
    }
}

/// Raw text returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub text: String,
    pub model: String,
}

/// One configured provider/model pair
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name reported in responses, e.g. `gemini`
    fn name(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Whether this client can serve the subject (vision vs text)
    fn supports(&self, subject: Subject) -> bool;

    /// Issue one request with the given timeout
    async fn call(&self, request: &ProviderRequest, timeout: Duration) -> Result<RawResult, ProviderError>;
}

/// Read a response body, classifying non-success statuses
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    timeout_ms: u64,
) -> Result<serde_json::Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status.as_u16(), &body));
    }
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ProviderError::from_reqwest(&e, timeout_ms))
}
