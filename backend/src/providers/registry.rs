//! Provider registry
//!
//! Built once at startup from configuration and environment credentials.
//! A provider whose credentials are missing is left out of every try-order
//! for the lifetime of the process.

use super::{CloudflareClient, DeepSeekClient, GeminiClient, ProviderClient, ProviderError};
use crate::config::{AiConfig, ProviderCredentials, ProviderKind};
use anyhow::Result;
use gofitai_shared::Subject;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Ordered provider clients per subject
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    by_subject: HashMap<Subject, Vec<Arc<dyn ProviderClient>>>,
    unavailable: Vec<(ProviderKind, ProviderError)>,
}

/// Clients constructed from the available credentials
#[derive(Default)]
struct ConfiguredClients {
    gemini_text: Option<Arc<dyn ProviderClient>>,
    gemini_vision: Option<Arc<dyn ProviderClient>>,
    deepseek: Option<Arc<dyn ProviderClient>>,
    cloudflare_text: Option<Arc<dyn ProviderClient>>,
    cloudflare_vision: Vec<Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    /// Build the registry from config and credentials
    pub fn build(ai: &AiConfig, credentials: &ProviderCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gofitai-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut unavailable = Vec::new();
        let mut clients = ConfiguredClients::default();

        match &credentials.gemini_api_key {
            Some(key) => {
                clients.gemini_text = Some(Arc::new(GeminiClient::new(
                    http.clone(),
                    &ai.gemini_base_url,
                    key.clone(),
                    &ai.gemini_model,
                )));
                clients.gemini_vision = Some(Arc::new(
                    GeminiClient::new(
                        http.clone(),
                        &ai.gemini_base_url,
                        key.clone(),
                        &ai.gemini_vision_model,
                    )
                    .vision(),
                ));
            }
            None => unavailable.push((
                ProviderKind::Gemini,
                ProviderError::Configuration("GEMINI_API_KEY is not set".to_string()),
            )),
        }

        match &credentials.deepseek_api_key {
            Some(key) => {
                clients.deepseek = Some(Arc::new(DeepSeekClient::new(
                    http.clone(),
                    &ai.deepseek_base_url,
                    key.clone(),
                    &ai.deepseek_model,
                )));
            }
            None => unavailable.push((
                ProviderKind::DeepSeek,
                ProviderError::Configuration("DEEPSEEK_API_KEY is not set".to_string()),
            )),
        }

        match (&credentials.cloudflare_api_token, &credentials.cloudflare_account_id) {
            (Some(token), Some(account)) => {
                let client = |model: &str, vision: bool| -> Arc<dyn ProviderClient> {
                    Arc::new(CloudflareClient::new(
                        http.clone(),
                        &ai.cloudflare_base_url,
                        account,
                        token.clone(),
                        model,
                        vision,
                    ))
                };
                clients.cloudflare_text = Some(client(&ai.cloudflare_text_model, false));
                clients.cloudflare_vision = ai
                    .cloudflare_vision_models
                    .iter()
                    .map(|m| client(m, true))
                    .collect();
            }
            _ => unavailable.push((
                ProviderKind::Cloudflare,
                ProviderError::Configuration(
                    "CF_API_TOKEN and CF_ACCOUNT_ID must both be set".to_string(),
                ),
            )),
        }

        for (kind, err) in &unavailable {
            warn!(provider = kind.as_str(), error = %err, "Provider disabled");
        }

        let mut by_subject = HashMap::new();
        for subject in Subject::ALL {
            let mut ordered: Vec<Arc<dyn ProviderClient>> = Vec::new();
            for kind in ai.provider_order.for_subject(subject) {
                let vision = subject == Subject::FoodAnalysis;
                match (kind, vision) {
                    (ProviderKind::Gemini, false) => ordered.extend(clients.gemini_text.clone()),
                    (ProviderKind::Gemini, true) => ordered.extend(clients.gemini_vision.clone()),
                    (ProviderKind::DeepSeek, _) => ordered.extend(clients.deepseek.clone()),
                    (ProviderKind::Cloudflare, false) => {
                        ordered.extend(clients.cloudflare_text.clone())
                    }
                    (ProviderKind::Cloudflare, true) => {
                        ordered.extend(clients.cloudflare_vision.iter().cloned())
                    }
                }
            }
            ordered.retain(|c| c.supports(subject));
            info!(
                subject = subject.as_str(),
                providers = ?ordered.iter().map(|c| format!("{}:{}", c.name(), c.model())).collect::<Vec<_>>(),
                "Provider order configured"
            );
            by_subject.insert(subject, ordered);
        }

        Ok(Self {
            by_subject,
            unavailable,
        })
    }

    /// Registry with explicit clients for one subject
    pub fn with_providers(mut self, subject: Subject, providers: Vec<Arc<dyn ProviderClient>>) -> Self {
        self.by_subject.insert(subject, providers);
        self
    }

    /// Providers to try for a subject, in order
    pub fn providers_for(&self, subject: Subject) -> &[Arc<dyn ProviderClient>] {
        self.by_subject
            .get(&subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct provider names across all subjects
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_subject
            .values()
            .flatten()
            .map(|c| c.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Provider families left out because of missing credentials
    pub fn unavailable(&self) -> &[(ProviderKind, ProviderError)] {
        &self.unavailable
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_string()))
    }

    #[test]
    fn test_no_credentials_means_no_providers() {
        let registry =
            ProviderRegistry::build(&AiConfig::default(), &ProviderCredentials::default()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.unavailable().len(), 3);
        assert!(registry.providers_for(Subject::Workout).is_empty());
    }

    #[test]
    fn test_missing_key_removes_provider_from_order() {
        let credentials = ProviderCredentials {
            deepseek_api_key: secret("ds"),
            ..Default::default()
        };
        let registry = ProviderRegistry::build(&AiConfig::default(), &credentials).unwrap();

        let workout = registry.providers_for(Subject::Workout);
        assert_eq!(workout.len(), 1);
        assert_eq!(workout[0].name(), "deepseek");
        assert!(registry.providers_for(Subject::FoodAnalysis).is_empty());
    }

    #[test]
    fn test_full_credentials_follow_configured_order() {
        let credentials = ProviderCredentials {
            gemini_api_key: secret("g"),
            deepseek_api_key: secret("ds"),
            cloudflare_api_token: secret("cf"),
            cloudflare_account_id: Some("acct".to_string()),
        };
        let registry = ProviderRegistry::build(&AiConfig::default(), &credentials).unwrap();

        let names: Vec<&str> = registry
            .providers_for(Subject::Workout)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["gemini", "deepseek", "cloudflare"]);

        let vision = registry.providers_for(Subject::FoodAnalysis);
        assert_eq!(vision[0].name(), "gemini_vision");
        assert_eq!(vision.len(), 1 + AiConfig::default().cloudflare_vision_models.len());
        assert_eq!(vision[1].model(), "@cf/llava-hf/llava-1.5-7b-hf");
        assert!(registry.unavailable().is_empty());
    }

    #[test]
    fn test_cloudflare_requires_account_id() {
        let credentials = ProviderCredentials {
            cloudflare_api_token: secret("cf"),
            ..Default::default()
        };
        let registry = ProviderRegistry::build(&AiConfig::default(), &credentials).unwrap();
        assert!(registry.is_empty());
    }
}
