//! AI generation API routes
//!
//! Every endpoint answers with the same envelope. Provider failures never
//! surface as errors: the orchestrator falls back to templates, so only
//! malformed requests produce a 4xx.

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::services::fallback::{daily_targets, meal_targets, FALLBACK_PROVIDER};
use crate::services::nutrition::nutrition_plan;
use crate::services::GenerationOutcome;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gofitai_shared::validation::validate_image_mime_type;
use gofitai_shared::{
    AiChatRequest, AnalyzeFoodRequest, FieldError, GenerateMealPlanRequest,
    GenerateNutritionPlanRequest, GenerateRecipeRequest, GenerateWorkoutPlanRequest, GenerationOptions, GenerationRequest,
    GenerationResponse, ImageInput, NormalizedPlan, NutritionPlanResponse, NutritionTargets, Subject, TimeoutClass,
    UserProfile,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Source recorded for plans that came from a provider
const AI_SOURCE: &str = "ai_generated";

const MAX_DESCRIPTION_CHARS: usize = 500;

/// Create generation routes
pub fn generation_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-workout-plan", post(generate_workout_plan))
        .route("/generate-daily-meal-plan", post(generate_daily_meal_plan))
        .route("/generate-nutrition-plan", post(generate_nutrition_plan))
        .route("/generate-recipe", post(generate_recipe))
        .route("/analyze-food", post(analyze_food))
        .route("/ai-chat", post(ai_chat))
}

fn respond(outcome: GenerationOutcome) -> GenerationResponse {
    GenerationResponse::new(outcome.plan, outcome.provider, outcome.used_ai)
}

/// `userId` as a UUID; anything else disables persistence
pub(crate) fn parse_user_id(raw: Option<&str>) -> Option<Uuid> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Trimmed, non-empty, de-duplicated ingredient names
pub(crate) fn clean_ingredients(ingredients: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for ingredient in ingredients {
        let ingredient = ingredient.trim();
        if ingredient.is_empty()
            || cleaned.iter().any(|c| c.eq_ignore_ascii_case(ingredient))
        {
            continue;
        }
        cleaned.push(ingredient.to_string());
    }
    cleaned
}

/// Decode a base64 image, accepting `data:<mime>;base64,` URLs
pub(crate) fn decode_image(image_base64: &str, mime_type: &str) -> Result<ImageInput, FieldError> {
    let (mime_type, payload) = match image_base64.trim().strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| FieldError::new("imageBase64", "Malformed data URL"))?;
            let mime = header.trim_end_matches(";base64");
            (mime.to_string(), data)
        }
        None => (mime_type.to_string(), image_base64.trim()),
    };

    let mime_type = mime_type.trim().to_lowercase();
    validate_image_mime_type(&mime_type).map_err(|m| FieldError::new("mimeType", m))?;

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| FieldError::new("imageBase64", "Image is not valid base64"))?;
    if bytes.is_empty() {
        return Err(FieldError::new("imageBase64", "No image provided"));
    }

    Ok(ImageInput { mime_type, bytes })
}

/// Food photo sent either as multipart form data (`foodImage` file part,
/// optional `foodDescription`) or as a JSON body with base64 image data
pub(crate) struct FoodUpload {
    pub image: ImageInput,
    pub description: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for FoodUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.trim_start().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            return read_food_form(multipart).await;
        }

        let ApiJson(body) = ApiJson::<AnalyzeFoodRequest>::from_request(req, state).await?;
        body.validate()?;
        Ok(Self {
            image: decode_image(&body.image_base64, &body.mime_type)?,
            description: body.description,
        })
    }
}

async fn read_food_form(mut multipart: Multipart) -> Result<FoodUpload, ApiError> {
    let mut image = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "foodImage" | "image" => {
                // clients that omit the part type send JPEG
                let mime_type = field
                    .content_type()
                    .unwrap_or("image/jpeg")
                    .trim()
                    .to_lowercase();
                validate_image_mime_type(&mime_type).map_err(|m| FieldError::new("mimeType", m))?;
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    return Err(FieldError::new("foodImage", "No image file provided").into());
                }
                image = Some(ImageInput {
                    mime_type,
                    bytes: bytes.to_vec(),
                });
            }
            "foodDescription" | "description" => {
                let text = field.text().await?;
                if text.chars().count() > MAX_DESCRIPTION_CHARS {
                    return Err(FieldError::new("foodDescription", "Description too long").into());
                }
                description = Some(text);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| FieldError::new("foodImage", "No image file provided"))?;
    Ok(FoodUpload { image, description })
}

fn validated_targets(targets: Option<NutritionTargets>) -> Result<Option<NutritionTargets>, FieldError> {
    if let Some(t) = &targets {
        t.validate()?;
    }
    Ok(targets)
}

/// POST /api/generate-workout-plan - Generate a weekly workout plan
///
/// Persists the plan when `userId` is a UUID and a database is configured.
async fn generate_workout_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateWorkoutPlanRequest>,
) -> ApiResult<Json<GenerationResponse>> {
    let profile = req
        .user_profile
        .ok_or_else(|| ApiError::BadRequest("Missing required profile data".to_string()))?
        .resolve();
    info!(
        level = %profile.training_level,
        goal = %profile.primary_goal,
        days = profile.days_per_week,
        "Generating workout plan"
    );

    let outcome = state
        .orchestrator()
        .generate(
            &GenerationRequest::new(Subject::Workout, profile)
                .with_timeout_class(TimeoutClass::Complex),
        )
        .await;

    let plan_id = match (
        parse_user_id(req.user_id.as_deref()),
        state.plans(),
        outcome.plan.as_workout(),
    ) {
        (Some(user_id), Some(store), Some(plan)) => {
            let source = if outcome.used_ai { AI_SOURCE } else { FALLBACK_PROVIDER };
            match store.upsert_workout_plan(user_id, plan, source).await {
                Ok(id) => {
                    info!(%user_id, plan_id = %id, "Workout plan saved");
                    Some(id)
                }
                Err(e) => {
                    warn!(%user_id, error = %e, "Failed to save workout plan");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(Json(respond(outcome).with_plan_id(plan_id)))
}

/// POST /api/generate-daily-meal-plan - Generate a one-day meal plan
async fn generate_daily_meal_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateMealPlanRequest>,
) -> ApiResult<Json<GenerationResponse>> {
    let mut profile = req.user_profile.unwrap_or_default();
    profile.dietary_preferences.extend(req.dietary_preferences);
    let profile = profile.resolve();

    let targets = validated_targets(req.targets)?.unwrap_or_else(|| daily_targets(&profile));
    info!(calories = targets.calories, "Generating meal plan");

    let options = GenerationOptions {
        seed: req.seed.unwrap_or_else(rand::random),
        ..Default::default()
    };
    let request = GenerationRequest::new(Subject::MealPlan, profile)
        .with_timeout_class(TimeoutClass::Complex)
        .with_targets(Some(targets))
        .with_options(options);

    let outcome = state.orchestrator().generate(&request).await;
    Ok(Json(respond(outcome)))
}

/// POST /api/generate-nutrition-plan - Daily targets from body metrics
///
/// Pure calculation; no provider is called.
async fn generate_nutrition_plan(
    ApiJson(req): ApiJson<GenerateNutritionPlanRequest>,
) -> ApiResult<Json<NutritionPlanResponse>> {
    let mut profile = req
        .user_profile
        .ok_or_else(|| ApiError::BadRequest("Missing required profile data".to_string()))?;
    profile.dietary_preferences.extend(req.dietary_preferences);
    let profile = profile.resolve();

    if profile.weight_kg.is_none() {
        return Err(FieldError::new("userProfile.weightKg", "Weight (20-500 kg) is required").into());
    }
    if profile.height_cm.is_none() {
        return Err(FieldError::new("userProfile.heightCm", "Height (50-300 cm) is required").into());
    }
    let plan = nutrition_plan(&profile)
        .ok_or_else(|| ApiError::BadRequest("Missing required profile data".to_string()))?;
    info!(
        calories = plan.daily_targets.calories,
        goal = %profile.primary_goal,
        "Nutrition plan calculated"
    );

    Ok(Json(NutritionPlanResponse::new(plan)))
}

/// POST /api/generate-recipe - Generate a single recipe
async fn generate_recipe(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRecipeRequest>,
) -> ApiResult<Json<GenerationResponse>> {
    let profile = req.user_profile.unwrap_or_default().resolve();
    let meal_type = req.meal_type.unwrap_or_default();
    let targets = validated_targets(req.targets)?
        .unwrap_or_else(|| meal_targets(&daily_targets(&profile), meal_type));
    let ingredients = clean_ingredients(req.ingredients);
    info!(%meal_type, ingredients = ingredients.len(), strict = req.strict, "Generating recipe");

    let options = GenerationOptions {
        meal_type: Some(meal_type),
        strict: req.strict && !ingredients.is_empty(),
        ingredients,
        seed: req.seed.unwrap_or_else(rand::random),
        ..Default::default()
    };
    let request = GenerationRequest::new(Subject::Recipe, profile)
        .with_timeout_class(TimeoutClass::Simple)
        .with_targets(Some(targets))
        .with_options(options);

    let outcome = state.orchestrator().generate(&request).await;
    Ok(Json(respond(outcome)))
}

/// POST /api/analyze-food - Estimate nutrition from a food photo
async fn analyze_food(
    State(state): State<AppState>,
    upload: FoodUpload,
) -> ApiResult<Json<GenerationResponse>> {
    let FoodUpload { image, description } = upload;
    info!(mime_type = %image.mime_type, bytes = image.bytes.len(), "Analyzing food image");

    let options = GenerationOptions {
        description: description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        image: Some(image),
        ..Default::default()
    };
    let request = GenerationRequest::new(Subject::FoodAnalysis, UserProfile::default().resolve())
        .with_timeout_class(TimeoutClass::Simple)
        .with_options(options);

    let outcome = state.orchestrator().generate(&request).await;
    Ok(Json(respond(outcome)))
}

/// POST /api/ai-chat - One coaching chat turn
async fn ai_chat(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AiChatRequest>,
) -> ApiResult<Json<GenerationResponse>> {
    req.validate()?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".to_string()));
    }

    let profile = req.user_profile.unwrap_or_default().resolve();
    let options = GenerationOptions {
        message: Some(message.to_string()),
        ..Default::default()
    };
    let request = GenerationRequest::new(Subject::Chat, profile)
        .with_timeout_class(TimeoutClass::Simple)
        .with_options(options);

    let outcome = state.orchestrator().generate(&request).await;
    if let NormalizedPlan::Chat(reply) = &outcome.plan {
        info!(provider = %outcome.provider, chars = reply.reply.len(), "Chat reply generated");
    }
    Ok(Json(respond(outcome)))
}
