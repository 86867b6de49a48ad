//! DeepSeek chat-completions client

use super::{read_success_body, ProviderClient, ProviderError, ProviderRequest, RawResult};
use async_trait::async_trait;
use gofitai_shared::Subject;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a professional chef, nutritionist and strength coach. \
Follow the requested output format exactly. When JSON is requested, respond with valid JSON only.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// DeepSeek client (OpenAI-compatible API)
pub struct DeepSeekClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl DeepSeekClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    fn build_request<'a>(&'a self, request: &'a ProviderRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 8000,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl ProviderClient for DeepSeekClient {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports(&self, subject: Subject) -> bool {
        subject != Subject::FoodAnalysis
    }

    #[instrument(skip(self, request), fields(model = %self.model, subject = %request.subject))]
    async fn call(&self, request: &ProviderRequest, timeout: Duration) -> Result<RawResult, ProviderError> {
        let timeout_ms = timeout.as_millis() as u64;
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .timeout(timeout)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, timeout_ms))?;

        let body = read_success_body(response, timeout_ms).await?;
        let parsed: ChatCompletionResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Transport {
                status: None,
                message: format!("unexpected response shape: {}", e),
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Transport {
                status: None,
                message: "response contained no choices".to_string(),
            })?;
        debug!(chars = text.len(), "DeepSeek response received");

        Ok(RawResult {
            text,
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DeepSeekClient {
        DeepSeekClient::new(
            reqwest::Client::new(),
            "https://api.deepseek.com/v1",
            SecretString::new("key".to_string()),
            "deepseek-chat",
        )
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let client = client();
        let request = ProviderRequest::new(Subject::Recipe, "recipe");
        let json = serde_json::to_value(client.build_request(&request)).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "recipe");
    }

    #[test]
    fn test_chat_has_no_response_format() {
        let client = client();
        let request = ProviderRequest::new(Subject::Chat, "hello");
        let json = serde_json::to_value(client.build_request(&request)).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_does_not_support_vision() {
        assert!(!client().supports(Subject::FoodAnalysis));
        assert!(client().supports(Subject::MealPlan));
    }
}
