//! Configuration management for the GoFitAI backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: GOFIT__)
//!
//! Provider API keys are never part of the config files. They are read from
//! their conventional environment variables by [`ProviderCredentials::from_env`].

use anyhow::Result;
use gofitai_shared::Subject;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole HTTP request, provider retries included
    pub request_timeout_secs: u64,
    /// Body limit, sized for base64-encoded food photos
    pub max_body_bytes: usize,
}

/// Database configuration
///
/// An empty `url` runs the service without plan persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Provider families known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    DeepSeek,
    Cloudflare,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Cloudflare => "cloudflare",
        }
    }
}

/// Exponential backoff constants for one error class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub cap_ms: u64,
}

/// Provider try-order per subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub workout: Vec<ProviderKind>,
    pub meal_plan: Vec<ProviderKind>,
    pub recipe: Vec<ProviderKind>,
    pub food_analysis: Vec<ProviderKind>,
    pub chat: Vec<ProviderKind>,
}

impl ProviderOrder {
    pub fn for_subject(&self, subject: Subject) -> &[ProviderKind] {
        match subject {
            Subject::Workout => &self.workout,
            Subject::MealPlan => &self.meal_plan,
            Subject::Recipe => &self.recipe,
            Subject::FoodAnalysis => &self.food_analysis,
            Subject::Chat => &self.chat,
        }
    }
}

impl Default for ProviderOrder {
    fn default() -> Self {
        use ProviderKind::*;
        Self {
            workout: vec![Gemini, DeepSeek, Cloudflare],
            meal_plan: vec![Gemini, DeepSeek],
            recipe: vec![Gemini, DeepSeek],
            food_analysis: vec![Gemini, Cloudflare],
            chat: vec![Gemini, DeepSeek, Cloudflare],
        }
    }
}

/// AI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_vision_model: String,
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    pub cloudflare_base_url: String,
    pub cloudflare_text_model: String,
    pub cloudflare_vision_models: Vec<String>,
    /// Timeout for full plan generation (workout, meal plan)
    pub complex_timeout_ms: u64,
    /// Timeout for single recipes, chat turns and photo analysis
    pub simple_timeout_ms: u64,
    /// Attempts per provider before moving to the next one
    pub max_attempts: u32,
    pub timeout_backoff: BackoffConfig,
    pub unavailable_backoff: BackoffConfig,
    pub rate_limit_backoff: BackoffConfig,
    pub max_jitter_ms: u64,
    pub provider_order: ProviderOrder,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_vision_model: "gemini-2.5-flash".to_string(),
            deepseek_base_url: "https://api.deepseek.com/v1".to_string(),
            deepseek_model: "deepseek-chat".to_string(),
            cloudflare_base_url: "https://api.cloudflare.com/client/v4".to_string(),
            cloudflare_text_model: "@cf/meta/llama-3.1-8b-instruct".to_string(),
            cloudflare_vision_models: vec![
                "@cf/llava-hf/llava-1.5-7b-hf".to_string(),
                "@cf/meta/llama-3.2-11b-vision-instruct".to_string(),
                "@cf/meta/llama-3.2-90b-vision-instruct".to_string(),
                "@cf/unum/uform-gen2-qwen-500m".to_string(),
            ],
            complex_timeout_ms: 360_000,
            simple_timeout_ms: 240_000,
            max_attempts: 3,
            timeout_backoff: BackoffConfig {
                base_ms: 2_000,
                cap_ms: 8_000,
            },
            unavailable_backoff: BackoffConfig {
                base_ms: 5_000,
                cap_ms: 15_000,
            },
            rate_limit_backoff: BackoffConfig {
                base_ms: 5_000,
                cap_ms: 15_000,
            },
            max_jitter_ms: 2_000,
            provider_order: ProviderOrder::default(),
        }
    }
}

impl AiConfig {
    pub fn complex_timeout(&self) -> Duration {
        Duration::from_millis(self.complex_timeout_ms)
    }

    pub fn simple_timeout(&self) -> Duration {
        Duration::from_millis(self.simple_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_secs: 1_800,
                max_body_bytes: 12 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
            },
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with GOFIT__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (GOFIT__ prefix)
            // e.g., GOFIT__AI__COMPLEX_TIMEOUT_MS=120000 sets ai.complex_timeout_ms
            .add_source(config::Environment::with_prefix("GOFIT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}

/// Provider secrets, read once at startup
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub gemini_api_key: Option<SecretString>,
    pub deepseek_api_key: Option<SecretString>,
    pub cloudflare_api_token: Option<SecretString>,
    pub cloudflare_account_id: Option<String>,
}

impl ProviderCredentials {
    /// Read provider keys from the environment; blank values count as missing
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        Self {
            gemini_api_key: var("GEMINI_API_KEY")
                .or_else(|| var("EXPO_PUBLIC_GEMINI_API_KEY"))
                .map(SecretString::new),
            deepseek_api_key: var("DEEPSEEK_API_KEY")
                .or_else(|| var("EXPO_PUBLIC_DEEPSEEK_API_KEY"))
                .map(SecretString::new),
            cloudflare_api_token: var("CF_API_TOKEN").map(SecretString::new),
            cloudflare_account_id: var("CF_ACCOUNT_ID"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.database.is_enabled());
    }

    #[test]
    fn test_default_timeout_tiers() {
        let ai = AiConfig::default();
        assert_eq!(ai.complex_timeout(), Duration::from_millis(360_000));
        assert_eq!(ai.simple_timeout(), Duration::from_millis(240_000));
        assert!(ai.timeout_backoff.cap_ms < ai.unavailable_backoff.cap_ms);
    }

    #[test]
    fn test_default_provider_order() {
        let order = ProviderOrder::default();
        assert_eq!(order.for_subject(Subject::Workout)[0], ProviderKind::Gemini);
        assert!(order
            .for_subject(Subject::MealPlan)
            .contains(&ProviderKind::DeepSeek));
        assert!(!order
            .for_subject(Subject::FoodAnalysis)
            .contains(&ProviderKind::DeepSeek));
    }

    #[test]
    fn test_provider_kind_serde() {
        let kinds: Vec<ProviderKind> =
            serde_json::from_str(r#"["gemini","deepseek","cloudflare"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![ProviderKind::Gemini, ProviderKind::DeepSeek, ProviderKind::Cloudflare]
        );
    }

    #[test]
    fn test_is_production() {
        // Default should be false (development)
        assert!(!AppConfig::is_production());
    }
}
