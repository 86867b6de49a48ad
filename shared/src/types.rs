//! API request and response types

use crate::models::{MealType, NutritionTargets, UserProfile};
use crate::plan::{NormalizedPlan, NutritionPlan, Recipe, WorkoutPlan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Requests
// ============================================================================

/// POST /api/generate-workout-plan body
///
/// Older app builds send `profile`, newer ones `userProfile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWorkoutPlanRequest {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(default, alias = "profile")]
    pub user_profile: Option<UserProfile>,
}

/// POST /api/generate-daily-meal-plan body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanRequest {
    #[serde(default, alias = "profile")]
    pub user_profile: Option<UserProfile>,
    #[serde(default, alias = "dailyTargets")]
    pub targets: Option<NutritionTargets>,
    #[serde(default, alias = "dietary_preferences", alias = "preferences")]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// POST /api/generate-recipe body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecipeRequest {
    #[serde(default, alias = "meal_type")]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub targets: Option<NutritionTargets>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, alias = "profile")]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// POST /api/generate-nutrition-plan body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNutritionPlanRequest {
    #[serde(default, alias = "profile")]
    pub user_profile: Option<UserProfile>,
    #[serde(default, alias = "dietary_preferences", alias = "preferences")]
    pub dietary_preferences: Vec<String>,
}

/// POST /api/analyze-food body
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFoodRequest {
    #[validate(length(min = 1, message = "No image provided"))]
    #[serde(alias = "image", alias = "image_base64")]
    pub image_base64: String,
    #[serde(default = "default_mime_type", alias = "mime_type")]
    pub mime_type: String,
    #[validate(length(max = 500, message = "Description too long"))]
    #[serde(default)]
    pub description: Option<String>,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

/// POST /api/ai-chat body
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AiChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub message: String,
    #[serde(default, alias = "profile")]
    pub user_profile: Option<UserProfile>,
}

// ============================================================================
// Responses
// ============================================================================

/// Plan payload, keyed the way each endpoint has always returned it
#[derive(Debug, Clone, Serialize)]
pub enum ResponsePayload {
    #[serde(rename = "workoutPlan")]
    WorkoutPlan(WorkoutPlan),
    #[serde(rename = "recipe")]
    Recipe(Recipe),
    #[serde(rename = "data")]
    Data(NormalizedPlan),
}

impl From<NormalizedPlan> for ResponsePayload {
    fn from(plan: NormalizedPlan) -> Self {
        match plan {
            NormalizedPlan::Workout(p) => ResponsePayload::WorkoutPlan(p),
            NormalizedPlan::Recipe(r) => ResponsePayload::Recipe(r),
            other => ResponsePayload::Data(other),
        }
    }
}

/// Response envelope shared by every generation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub provider: String,
    pub used_ai: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResponse {
    pub fn new(plan: NormalizedPlan, provider: impl Into<String>, used_ai: bool) -> Self {
        Self {
            success: true,
            payload: plan.into(),
            provider: provider.into(),
            used_ai,
            plan_id: None,
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_plan_id(mut self, plan_id: Option<Uuid>) -> Self {
        self.plan_id = plan_id;
        self
    }
}

/// POST /api/generate-nutrition-plan response
#[derive(Debug, Clone, Serialize)]
pub struct NutritionPlanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub plan: NutritionPlan,
    pub generated_at: DateTime<Utc>,
}

impl NutritionPlanResponse {
    pub fn new(plan: NutritionPlan) -> Self {
        Self {
            success: true,
            plan,
            generated_at: Utc::now(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
            field: None,
        }
    }
}
