//! Google Gemini client (text and vision)

use super::{read_success_body, ProviderClient, ProviderError, ProviderRequest, RawResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gofitai_shared::Subject;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const TEXT_TEMPERATURE: f32 = 0.7;
const VISION_TEMPERATURE: f32 = 0.1;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 8000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` client bound to one model
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    vision: bool,
}

impl GeminiClient {
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
            vision: false,
        }
    }

    /// Same endpoint, used for photo analysis
    pub fn vision(mut self) -> Self {
        self.vision = true;
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: STANDARD.encode(&image.bytes),
                },
            });
        }

        GeminiRequest {
            contents: vec![GeminiContent { role: "user", parts }],
            generation_config: GenerationConfig {
                temperature: if self.vision { VISION_TEMPERATURE } else { TEXT_TEMPERATURE },
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: request.json_mode.then_some("application/json"),
            },
        }
    }

    fn extract_text(response: GeminiResponse) -> Result<String, ProviderError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Transport {
                status: None,
                message: "response contained no candidates".to_string(),
            })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason == "SAFETY" || reason == "RECITATION" {
                return Err(ProviderError::Transport {
                    status: None,
                    message: format!("generation blocked: {}", reason),
                });
            }
        }

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &str {
        if self.vision {
            "gemini_vision"
        } else {
            "gemini"
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
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .timeout(timeout)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, timeout_ms))?;

        let body = read_success_body(response, timeout_ms).await?;
        let parsed: GeminiResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Transport {
                status: None,
                message: format!("unexpected response shape: {}", e),
            })?;
        let text = Self::extract_text(parsed)?;
        debug!(chars = text.len(), "Gemini response received");

        Ok(RawResult {
            text,
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gofitai_shared::ImageInput;

    fn client() -> GeminiClient {
        GeminiClient::new(
            reqwest::Client::new(),
            "http://localhost/v1beta/",
            SecretString::new("key".to_string()),
            "gemini-2.5-flash",
        )
    }

    #[test]
    fn test_text_request_shape() {
        let request = ProviderRequest::new(Subject::Workout, "plan please");
        let json = serde_json::to_value(client().build_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "plan please");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8000);
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_vision_request_includes_inline_data() {
        let request = ProviderRequest::new(Subject::FoodAnalysis, "what is this").with_image(Some(
            ImageInput {
                mime_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            },
        ));
        let json = serde_json::to_value(client().vision().build_request(&request)).unwrap();
        let part = &json["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(part["mime_type"], "image/png");
        assert_eq!(part["data"], "AQID");
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_supports_matches_mode() {
        assert!(client().supports(Subject::Workout));
        assert!(!client().supports(Subject::FoodAnalysis));
        assert!(client().vision().supports(Subject::FoodAnalysis));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiClient::extract_text(response).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_extract_text_without_candidates_fails() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(GeminiClient::extract_text(response).is_err());
    }
}
