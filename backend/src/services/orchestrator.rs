//! Provider orchestration
//!
//! Walks the configured providers for a subject in order. The first provider
//! whose output parses into a valid plan wins; when every provider has failed
//! the rule-based generator produces the result instead.

use super::fallback::{self, FALLBACK_PROVIDER};
use super::normalize::ExpectedShape;
use super::parser::{self, ParseError};
use super::prompt;
use crate::config::AiConfig;
use crate::providers::{
    with_retry, AttemptOutcome, ProviderClient, ProviderRegistry, ProviderRequest, RetryPolicy,
};
use chrono::{DateTime, Utc};
use gofitai_shared::{GenerationRequest, NormalizedPlan, Subject, TimeoutClass};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Position of a request in the provider walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    NotStarted,
    Trying(usize),
    Succeeded,
    Exhausted,
}

impl OrchestratorState {
    /// State after starting or after a failed provider
    pub fn advance(self, provider_count: usize) -> Self {
        match self {
            OrchestratorState::NotStarted if provider_count > 0 => OrchestratorState::Trying(0),
            OrchestratorState::Trying(i) if i + 1 < provider_count => {
                OrchestratorState::Trying(i + 1)
            }
            OrchestratorState::Succeeded => OrchestratorState::Succeeded,
            _ => OrchestratorState::Exhausted,
        }
    }
}

/// One call to one provider, kept for logging and the response metadata
#[derive(Debug, Clone, Serialize)]
pub struct ProviderAttempt {
    pub provider_name: String,
    pub model_id: String,
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub timeout_ms: u64,
    pub elapsed_ms: u64,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response_text: Option<String>,
}

/// Result of a generation request
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub plan: NormalizedPlan,
    pub provider: String,
    pub model: Option<String>,
    pub used_ai: bool,
    pub attempts: Vec<ProviderAttempt>,
}

/// Provider walk with per-provider retry and rule-based fallback
pub struct Orchestrator {
    registry: ProviderRegistry,
    policy: RetryPolicy,
    complex_timeout: Duration,
    simple_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        registry: ProviderRegistry,
        policy: RetryPolicy,
        complex_timeout: Duration,
        simple_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            policy,
            complex_timeout,
            simple_timeout,
        }
    }

    pub fn from_config(registry: ProviderRegistry, ai: &AiConfig) -> Self {
        Self::new(
            registry,
            RetryPolicy::from_config(ai),
            ai.complex_timeout(),
            ai.simple_timeout(),
        )
    }

    #[inline]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Complex => self.complex_timeout,
            TimeoutClass::Simple => self.simple_timeout,
        }
    }

    /// Produce a plan for the request. Never fails.
    #[instrument(skip_all, fields(subject = %request.subject))]
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let subject = request.subject;
        let prompt = prompt::compose(
            subject,
            &request.profile,
            request.targets.as_ref(),
            &request.options,
        );
        let provider_request =
            ProviderRequest::new(subject, prompt).with_image(request.options.image.clone());
        let expected = ExpectedShape::new(subject, &request.profile)
            .with_meal_type(request.options.meal_type);
        let mut attempts = Vec::new();

        let timeout = self.timeout_for(request.timeout_class);

        if let Some((plan, client)) = self
            .try_providers_in_order(&provider_request, &expected, timeout, &mut attempts)
            .await
        {
            record_generation(subject, client.name(), true);
            return GenerationOutcome {
                plan,
                provider: client.name().to_string(),
                model: Some(client.model().to_string()),
                used_ai: true,
                attempts,
            };
        }

        warn!(
            providers = self.registry.providers_for(subject).len(),
            attempts = attempts.len(),
            "All providers failed, using rule-based fallback"
        );
        record_generation(subject, FALLBACK_PROVIDER, false);
        GenerationOutcome {
            plan: fallback::generate(
                subject,
                &request.profile,
                request.targets.as_ref(),
                &request.options,
            ),
            provider: FALLBACK_PROVIDER.to_string(),
            model: None,
            used_ai: false,
            attempts,
        }
    }

    /// Outer layer: move to the next provider only once the current one has
    /// exhausted its retries or returned output that does not parse.
    async fn try_providers_in_order(
        &self,
        request: &ProviderRequest,
        expected: &ExpectedShape<'_>,
        timeout: Duration,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> Option<(NormalizedPlan, &dyn ProviderClient)> {
        let providers = self.registry.providers_for(request.subject);
        let mut state = OrchestratorState::NotStarted.advance(providers.len());

        while let OrchestratorState::Trying(index) = state {
            let client = providers[index].as_ref();
            debug!(provider = client.name(), model = client.model(), index, "Trying provider");

            if let Some(plan) = self
                .try_provider(client, request, expected, timeout, attempts)
                .await
            {
                state = OrchestratorState::Succeeded;
                info!(
                    provider = client.name(),
                    model = client.model(),
                    attempts = attempts.len(),
                    ?state,
                    "Generation succeeded"
                );
                return Some((plan, client));
            }

            state = state.advance(providers.len());
        }

        debug!(?state, "Provider walk finished without a result");
        None
    }

    /// Retry one provider, then parse its output.
    ///
    /// Parse failures are not retried against the same provider.
    async fn try_provider(
        &self,
        client: &dyn ProviderClient,
        request: &ProviderRequest,
        expected: &ExpectedShape<'_>,
        timeout: Duration,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> Option<NormalizedPlan> {
        let outcome = with_retry(&self.policy, client.name(), |_| client.call(request, timeout)).await;

        let timeout_ms = timeout.as_millis() as u64;
        attempts.extend(outcome.attempts.iter().map(|log| ProviderAttempt {
            provider_name: client.name().to_string(),
            model_id: client.model().to_string(),
            attempt: log.attempt,
            started_at: log.started_at,
            timeout_ms,
            elapsed_ms: log.elapsed.as_millis() as u64,
            outcome: log.outcome,
            raw_response_text: None,
        }));

        let raw = match outcome.result {
            Ok(raw) => raw,
            Err(err) => {
                warn!(provider = client.name(), error = %err, "Provider failed");
                return None;
            }
        };

        let parsed = parser::parse(&raw.text, expected).and_then(|plan| {
            if plan.is_structurally_valid() {
                Ok(plan)
            } else {
                Err(ParseError::Shape("plan failed structural validation".to_string()))
            }
        });

        if let Some(last) = attempts.last_mut() {
            last.model_id = raw.model.clone();
            last.raw_response_text = Some(raw.text.clone());
        }

        match parsed {
            Ok(plan) => Some(plan),
            Err(err) => {
                warn!(
                    provider = client.name(),
                    error = %err,
                    response_chars = raw.text.len(),
                    "Provider response could not be parsed"
                );
                if let Some(last) = attempts.last_mut() {
                    last.outcome = AttemptOutcome::ParseFailure;
                }
                None
            }
        }
    }
}

fn record_generation(subject: Subject, provider: &str, used_ai: bool) {
    metrics::counter!(
        "ai_generation_total",
        "subject" => subject.as_str(),
        "provider" => provider.to_string(),
        "used_ai" => if used_ai { "true" } else { "false" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderError, RawResult};
    use async_trait::async_trait;
    use gofitai_shared::{PrimaryGoal, UserProfile, WorkoutFrequency};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Client that replays a fixed script of responses
    struct ScriptedClient {
        name: &'static str,
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedClient {
        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn supports(&self, _subject: Subject) -> bool {
            true
        }

        async fn call(&self, _request: &ProviderRequest, _timeout: Duration) -> Result<RawResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::Timeout(10)));
            next.map(|text| RawResult {
                text,
                model: "test-model".to_string(),
            })
        }
    }

    fn orchestrator(subject: Subject, clients: Vec<Arc<ScriptedClient>>) -> Orchestrator {
        let providers: Vec<Arc<dyn ProviderClient>> = clients
            .into_iter()
            .map(|c| c as Arc<dyn ProviderClient>)
            .collect();
        Orchestrator::new(
            ProviderRegistry::default().with_providers(subject, providers),
            RetryPolicy::default(),
            Duration::from_secs(360),
            Duration::from_secs(240),
        )
    }

    fn workout_request(code: &str) -> GenerationRequest {
        let profile = UserProfile {
            workout_frequency: Some(WorkoutFrequency::new(code)),
            primary_goal: Some(PrimaryGoal::FatLoss),
            ..Default::default()
        }
        .resolve();
        GenerationRequest::new(Subject::Workout, profile).with_timeout_class(TimeoutClass::Complex)
    }

    const VALID_WORKOUT: &str = r#"```json
{"plan_name": "AI Plan", "weekly_schedule": [
  {"day": "Monday", "focus": "Push", "exercises": [{"name": "Bench Press", "sets": 4, "reps": "8", "rest_seconds": 90}]},
  {"day": "Wednesday", "focus": "Pull", "exercises": [{"name": "Barbell Row", "sets": 4, "reps": "8", "rest_seconds": 90}]},
  {"day": "Friday", "focus": "Legs", "exercises": [{"name": "Squat", "sets": 4, "reps": "8", "rest_seconds": 90}]}
]}
```"#;

    #[test]
    fn test_state_transitions() {
        assert_eq!(OrchestratorState::NotStarted.advance(2), OrchestratorState::Trying(0));
        assert_eq!(OrchestratorState::Trying(0).advance(2), OrchestratorState::Trying(1));
        assert_eq!(OrchestratorState::Trying(1).advance(2), OrchestratorState::Exhausted);
        assert_eq!(OrchestratorState::NotStarted.advance(0), OrchestratorState::Exhausted);
        assert_eq!(OrchestratorState::Succeeded.advance(2), OrchestratorState::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_wins() {
        let first = ScriptedClient::new("gemini", vec![Ok(VALID_WORKOUT.to_string())]);
        let second = ScriptedClient::new("deepseek", vec![Ok(VALID_WORKOUT.to_string())]);
        let orch = orchestrator(Subject::Workout, vec![first.clone(), second.clone()]);

        let outcome = orch.generate(&workout_request("3")).await;

        assert!(outcome.used_ai);
        assert_eq!(outcome.provider, "gemini");
        assert_eq!(outcome.model.as_deref(), Some("test-model"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::Success);
        assert!(outcome.attempts[0].raw_response_text.is_some());
        assert_eq!(outcome.plan.as_workout().unwrap().plan_name, "AI Plan");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_failure_advances_without_retry() {
        let first = ScriptedClient::new("gemini", vec![Ok("I cannot help with that.".to_string())]);
        let second = ScriptedClient::new("deepseek", vec![Ok(VALID_WORKOUT.to_string())]);
        let orch = orchestrator(Subject::Workout, vec![first.clone(), second.clone()]);

        let outcome = orch.generate(&workout_request("3")).await;

        assert_eq!(first.calls(), 1);
        assert_eq!(outcome.provider, "deepseek");
        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::ParseFailure);
        assert_eq!(outcome.attempts[1].outcome, AttemptOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_errors_then_success_on_same_provider() {
        let first = ScriptedClient::new(
            "gemini",
            vec![
                Err(ProviderError::ServiceUnavailable),
                Err(ProviderError::RateLimited),
                Ok(VALID_WORKOUT.to_string()),
            ],
        );
        let orch = orchestrator(Subject::Workout, vec![first.clone()]);

        let outcome = orch.generate(&workout_request("3")).await;

        assert!(outcome.used_ai);
        assert_eq!(first.calls(), 3);
        let outcomes: Vec<AttemptOutcome> = outcome.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::ServiceUnavailable,
                AttemptOutcome::RateLimited,
                AttemptOutcome::Success
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_timeouts_fall_back() {
        let first = ScriptedClient::new("gemini", vec![]);
        let second = ScriptedClient::new("deepseek", vec![]);
        let orch = orchestrator(Subject::Workout, vec![first.clone(), second.clone()]);

        let outcome = orch.generate(&workout_request("3")).await;

        assert!(!outcome.used_ai);
        assert_eq!(outcome.provider, FALLBACK_PROVIDER);
        assert!(outcome.model.is_none());
        assert_eq!(first.calls(), 3);
        assert_eq!(second.calls(), 3);
        assert_eq!(outcome.attempts.len(), 6);
        assert!(outcome.plan.is_structurally_valid());
        assert_eq!(outcome.plan.as_workout().unwrap().weekly_schedule.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_not_retried() {
        let first = ScriptedClient::new(
            "gemini",
            vec![Err(ProviderError::Transport {
                status: Some(400),
                message: "bad".into(),
            })],
        );
        let orch = orchestrator(Subject::Workout, vec![first.clone()]);

        let outcome = orch.generate(&workout_request("3")).await;

        assert_eq!(first.calls(), 1);
        assert!(!outcome.used_ai);
        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::OtherError);
    }

    #[tokio::test]
    async fn test_no_providers_goes_straight_to_fallback() {
        let orch = orchestrator(Subject::Chat, vec![]);
        let request = GenerationRequest::new(Subject::Chat, Default::default());

        let outcome = orch.generate(&request).await;

        assert!(!outcome.used_ai);
        assert!(outcome.attempts.is_empty());
        assert!(matches!(outcome.plan, NormalizedPlan::Chat(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_plain_text_is_accepted() {
        let client = ScriptedClient::new("gemini", vec![Ok("Drink more water.".to_string())]);
        let orch = orchestrator(Subject::Chat, vec![client]);
        let request = GenerationRequest::new(Subject::Chat, Default::default());

        let outcome = orch.generate(&request).await;

        assert!(outcome.used_ai);
        match outcome.plan {
            NormalizedPlan::Chat(reply) => assert_eq!(reply.reply, "Drink more water."),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_timeout_tiers() {
        let orch = orchestrator(Subject::Workout, vec![]);
        assert_eq!(orch.timeout_for(TimeoutClass::Complex), Duration::from_secs(360));
        assert_eq!(orch.timeout_for(TimeoutClass::Simple), Duration::from_secs(240));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_use_caller_timeout_class() {
        let client = ScriptedClient::new("gemini", vec![Ok("Sleep well.".to_string())]);
        let orch = orchestrator(Subject::Chat, vec![client]);

        let simple = GenerationRequest::new(Subject::Chat, Default::default());
        let outcome = orch.generate(&simple).await;
        assert_eq!(outcome.attempts[0].timeout_ms, 240_000);

        let client = ScriptedClient::new("gemini", vec![Ok("Sleep well.".to_string())]);
        let orch = orchestrator(Subject::Chat, vec![client]);
        let complex = GenerationRequest::new(Subject::Chat, Default::default())
            .with_timeout_class(TimeoutClass::Complex);
        let outcome = orch.generate(&complex).await;
        assert_eq!(outcome.attempts[0].timeout_ms, 360_000);
    }
}
