//! Cloudflare Workers AI client
//!
//! One client per model. Vision models receive the raw image bytes; text
//! models receive a chat-style `messages` payload.

use super::{read_success_body, ProviderClient, ProviderError, ProviderRequest, RawResult};
use async_trait::async_trait;
use gofitai_shared::Subject;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const VISION_MAX_TOKENS: u32 = 1000;

/// Workers AI `ai/run` client bound to one model
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    api_token: SecretString,
    model: String,
    vision: bool,
}

impl CloudflareClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        account_id: impl Into<String>,
        api_token: SecretString,
        model: impl Into<String>,
        vision: bool,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_id: account_id.into(),
            api_token,
            model: model.into(),
            vision,
        }
    }

    fn build_payload(&self, request: &ProviderRequest) -> Value {
        match (&request.image, self.vision) {
            (Some(image), true) => json!({
                "image": image.bytes,
                "prompt": request.prompt,
                "max_tokens": VISION_MAX_TOKENS,
            }),
            _ => json!({
                "messages": [
                    {
                        "role": "system",
                        "content": "You are a helpful fitness and nutrition assistant.",
                    },
                    { "role": "user", "content": request.prompt },
                ],
                "max_tokens": 4096,
            }),
        }
    }

    /// Workers AI puts the text in `result.response` (or `result.description` for some vision models)
    fn extract_text(body: &Value) -> Result<String, ProviderError> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = body
                .get("errors")
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ProviderError::Transport {
                status: None,
                message,
            });
        }

        let result = body.get("result").unwrap_or(body);
        ["response", "description"]
            .iter()
            .find_map(|key| result.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Transport {
                status: None,
                message: "response contained no text".to_string(),
            })
    }
}

#[async_trait]
impl ProviderClient for CloudflareClient {
    fn name(&self) -> &str {
        if self.vision {
            "cloudflare_vision"
        } else {
            "cloudflare"
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports(&self, subject: Subject) -> bool {
        (subject == Subject::FoodAnalysis) == self.vision
    }

    #[instrument(skip(self, request), fields(model = %self.model, subject = %request.subject))]
    async fn call(&self, request: &ProviderRequest, timeout: Duration) -> Result<RawResult, ProviderError> {
        let timeout_ms = timeout.as_millis() as u64;
        let url = format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, self.model
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_token.expose_secret())
            .timeout(timeout)
            .json(&self.build_payload(request))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, timeout_ms))?;

        let body = read_success_body(response, timeout_ms).await?;
        let text = Self::extract_text(&body)?;
        debug!(chars = text.len(), "Cloudflare response received");

        Ok(RawResult {
            text,
            model: self.model.clone(),
        })
    }
}
