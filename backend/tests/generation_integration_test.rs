//! Integration tests for the generation endpoints

mod common;

use axum::http::StatusCode;
use common::{multipart_body, multipart_content_type, MemoryPlanStore, ScriptedProvider, TestApp};
use gofitai_backend::providers::{ProviderClient, ProviderError, ProviderRegistry};
use gofitai_shared::Subject;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn beginner_fat_loss() -> Value {
    json!({
        "trainingLevel": "beginner",
        "primaryGoal": "fat_loss",
        "workoutFrequency": "3"
    })
}

fn ai_workout_reply() -> String {
    let day = |name: &str, focus: &str| {
        json!({
            "day": name,
            "focus": focus,
            "exercises": [
                {"name": "Goblet Squat", "sets": 3, "reps": "12", "rest": "60s"},
                {"name": "Push-Up", "sets": 3, "reps": "10-12", "rest_seconds": 60}
            ]
        })
    };
    format!(
        "Here is your plan:\n```json\n{}\n```",
        json!({
            "plan_name": "Starter Shred",
            "weeklySchedule": [
                day("Monday", "Full Body"),
                day("Wednesday", "Full Body"),
                day("Friday", "Full Body")
            ]
        })
    )
}

// ============================================================================
// Workout plans
// ============================================================================

#[tokio::test]
async fn test_workout_falls_back_when_all_providers_fail() {
    let app = TestApp::with_providers(
        Subject::Workout,
        vec![ScriptedProvider::failing("gemini"), ScriptedProvider::failing("deepseek")],
    );

    let (status, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "userProfile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["provider"], "rule_based_fallback");
    assert_eq!(body["used_ai"], false);

    let schedule = body["workoutPlan"]["weekly_schedule"].as_array().unwrap();
    assert_eq!(schedule.len(), 3);
    for day in schedule {
        assert!(!day["exercises"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_workout_from_provider_reply() {
    let app = TestApp::with_providers(
        Subject::Workout,
        vec![ScriptedProvider::new("gemini", vec![Ok(ai_workout_reply())])],
    );

    let (status, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "userProfile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "gemini");
    assert_eq!(body["used_ai"], true);
    assert_eq!(body["workoutPlan"]["plan_name"], "Starter Shred");
    assert_eq!(body["workoutPlan"]["weekly_schedule"][0]["exercises"][0]["rest_seconds"], 60);
}

#[tokio::test]
async fn test_unparseable_reply_moves_to_next_provider() {
    let app = TestApp::with_providers(
        Subject::Workout,
        vec![
            ScriptedProvider::new("gemini", vec![Ok("I cannot help with that.".to_string())]),
            ScriptedProvider::new("deepseek", vec![Ok(ai_workout_reply())]),
        ],
    );

    let (_, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "profile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(body["provider"], "deepseek");
    assert_eq!(body["used_ai"], true);
}

#[tokio::test]
async fn test_workout_requires_profile() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/generate-workout-plan", json!({ "userId": "abc" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required profile data");
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/generate-workout-plan", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "MALFORMED_BODY");
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_workout_plan_persisted_for_uuid_user() {
    let store = Arc::new(MemoryPlanStore::default());
    let app = TestApp::with_plan_store(ProviderRegistry::default(), store.clone());
    let user_id = Uuid::new_v4();

    let (status, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "userId": user_id.to_string(), "userProfile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["plan_id"].as_str().is_some());

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, user_id);
    assert_eq!(saved[0].2, "rule_based_fallback");
}

#[tokio::test]
async fn test_provider_plan_persisted_as_ai_generated() {
    let store = Arc::new(MemoryPlanStore::default());
    let provider: Arc<dyn ProviderClient> =
        ScriptedProvider::new("gemini", vec![Ok(ai_workout_reply())]);
    let registry = ProviderRegistry::default().with_providers(Subject::Workout, vec![provider]);
    let app = TestApp::with_plan_store(registry, store.clone());

    app.post_json(
        "/api/generate-workout-plan",
        json!({ "userId": Uuid::new_v4().to_string(), "userProfile": beginner_fat_loss() }),
    )
    .await;

    assert_eq!(store.saved.lock().unwrap()[0].2, "ai_generated");
}

#[tokio::test]
async fn test_non_uuid_user_is_not_persisted() {
    let store = Arc::new(MemoryPlanStore::default());
    let app = TestApp::with_plan_store(ProviderRegistry::default(), store.clone());

    let (status, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "userId": "guest-42", "userProfile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("plan_id").is_none());
    assert_eq!(store.saved_count(), 0);
}

#[tokio::test]
async fn test_store_failure_still_returns_plan() {
    let store = Arc::new(MemoryPlanStore::failing());
    let app = TestApp::with_plan_store(ProviderRegistry::default(), store.clone());

    let (status, body) = app
        .post_json(
            "/api/generate-workout-plan",
            json!({ "userId": Uuid::new_v4().to_string(), "userProfile": beginner_fat_loss() }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body.get("plan_id").is_none());
}

// ============================================================================
// Meal plans and recipes
// ============================================================================

#[tokio::test]
async fn test_meal_plan_fallback_envelope() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/generate-daily-meal-plan",
            json!({
                "targets": {"calories": 2200, "protein": 160, "carbs": 220, "fat": 70},
                "dietaryPreferences": ["vegan"],
                "seed": 7
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "rule_based_fallback");
    let meals = body["data"]["meals"].as_array().unwrap();
    assert!(!meals.is_empty());
    assert!(meals.iter().all(|m| !m["recipe_name"].as_str().unwrap().is_empty()));
}

#[tokio::test]
async fn test_meal_plan_rejects_negative_targets() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/generate-daily-meal-plan",
            json!({ "targets": {"calories": -5, "proteinG": 100, "carbsG": 100, "fatG": 50} }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "targets.calories");
}

#[tokio::test]
async fn test_strict_recipe_uses_only_given_ingredients() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/generate-recipe",
            json!({
                "mealType": "dinner",
                "ingredients": ["chicken", " rice ", "Chicken", ""],
                "strict": true
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let recipe = &body["recipe"];
    assert_eq!(recipe["meal_type"], "dinner");
    let names: Vec<String> = recipe["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_lowercase())
        .collect();
    assert_eq!(names, vec!["chicken", "rice"]);
}

// ============================================================================
// Nutrition targets
// ============================================================================

#[tokio::test]
async fn test_nutrition_plan_is_calculated_without_providers() {
    let provider = ScriptedProvider::failing("gemini");
    let app = TestApp::with_providers(Subject::MealPlan, vec![provider.clone()]);

    let (status, body) = app
        .post_json(
            "/api/generate-nutrition-plan",
            json!({
                "profile": {
                    "full_name": "Alex",
                    "age": 28,
                    "gender": "female",
                    "weight": 60,
                    "height": 165,
                    "activity_level": "lightly_active",
                    "fitness_strategy": "fat_loss"
                },
                "preferences": ["keto"]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["plan_name"], "Alex's Nutrition Plan");
    assert_eq!(body["metabolic_calculations"]["strategy"], "fat_loss");
    assert_eq!(body["metabolic_calculations"]["caloric_adjustment"], "-15%");
    assert_eq!(body["metabolic_calculations"]["activity_level"], "lightly_active");

    let targets = &body["daily_targets"];
    let calories = targets["calories"].as_f64().unwrap();
    assert_eq!(targets["carbs_grams"].as_f64().unwrap(), (calories * 0.05 / 4.0).round());
    assert_eq!(targets["fiber_grams"].as_f64().unwrap(), (calories / 100.0).round());
    assert_eq!(targets["water_liters"].as_f64().unwrap(), 2.1);
    assert_eq!(body["micronutrients_targets"]["iron_mg"], 18);
    assert!(provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_nutrition_plan_requires_profile() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/generate-nutrition-plan", json!({ "preferences": [] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required profile data");
}

#[tokio::test]
async fn test_nutrition_plan_requires_body_metrics() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/generate-nutrition-plan",
            json!({ "userProfile": { "weightKg": 70 } }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "userProfile.heightCm");
}

// ============================================================================
// Food analysis and chat
// ============================================================================

#[tokio::test]
async fn test_analyze_food_rejects_bad_base64() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/analyze-food",
            json!({ "imageBase64": "%%%not-base64%%%", "mimeType": "image/jpeg" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "imageBase64");
}

#[tokio::test]
async fn test_analyze_food_rejects_unsupported_mime() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/analyze-food",
            json!({ "imageBase64": "/9j/4AA=", "mimeType": "application/pdf" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "mimeType");
}

#[tokio::test]
async fn test_analyze_food_fallback_uses_description() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/analyze-food",
            json!({ "imageBase64": "/9j/4AA=", "description": "grilled chicken and rice" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["used_ai"], false);
    let confidence = body["data"]["confidence"].as_u64().unwrap();
    assert!(confidence <= 100);
    assert!(!body["data"]["foodName"].as_str().unwrap().is_empty());
}

const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];

#[tokio::test]
async fn test_analyze_food_accepts_multipart_upload() {
    let app = TestApp::new();
    let body = multipart_body(&[
        ("foodImage", Some("image/jpeg"), JPEG_BYTES),
        ("foodDescription", None, b"grilled chicken and rice".as_slice()),
    ]);

    let (status, body) = app
        .post_bytes("/api/analyze-food", &multipart_content_type(), body)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["foodName"], "Chicken with Rice");
}

#[tokio::test]
async fn test_multipart_image_reaches_provider() {
    let provider = ScriptedProvider::new(
        "gemini",
        vec![Ok(json!({
            "foodName": "Avocado Toast",
            "confidence": 0.8,
            "totalNutrition": {"calories": 320, "protein": 9, "carbohydrates": 30, "fat": 18}
        })
        .to_string())],
    );
    let app = TestApp::with_providers(Subject::FoodAnalysis, vec![provider.clone()]);
    let body = multipart_body(&[("foodImage", Some("image/png"), b"\x89PNG\r\n".as_slice())]);

    let (status, body) = app
        .post_bytes("/api/analyze-food", &multipart_content_type(), body)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "gemini");
    assert_eq!(body["data"]["foodName"], "Avocado Toast");

    let requests = provider.requests.lock().unwrap();
    let image = requests[0].image.as_ref().unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.bytes, b"\x89PNG\r\n".to_vec());
}

#[tokio::test]
async fn test_multipart_part_without_type_is_jpeg() {
    let provider = ScriptedProvider::failing("gemini");
    let app = TestApp::with_providers(Subject::FoodAnalysis, vec![provider.clone()]);
    let body = multipart_body(&[("foodImage", None, JPEG_BYTES)]);

    let (status, _) = app
        .post_bytes("/api/analyze-food", &multipart_content_type(), body)
        .await;

    assert_eq!(status, StatusCode::OK);
    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].image.as_ref().unwrap().mime_type, "image/jpeg");
}

#[tokio::test]
async fn test_multipart_without_image_is_rejected() {
    let app = TestApp::new();
    let body = multipart_body(&[("foodDescription", None, b"salad".as_slice())]);

    let (status, body) = app
        .post_bytes("/api/analyze-food", &multipart_content_type(), body)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "foodImage");
}

#[tokio::test]
async fn test_multipart_rejects_unsupported_mime() {
    let app = TestApp::new();
    let body = multipart_body(&[("foodImage", Some("application/pdf"), b"%PDF-1.4".as_slice())]);

    let (status, body) = app
        .post_bytes("/api/analyze-food", &multipart_content_type(), body)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "mimeType");
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let app = TestApp::new();

    let (status, body) = app.post_json("/api/ai-chat", json!({ "message": "   " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_chat_plain_text_reply() {
    let app = TestApp::with_providers(
        Subject::Chat,
        vec![ScriptedProvider::new(
            "gemini",
            vec![Ok("Aim for 7-9 hours of sleep to support recovery.".to_string())],
        )],
    );

    let (status, body) = app
        .post_json("/api/ai-chat", json!({ "message": "How much should I sleep?" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "gemini");
    assert!(body["data"]["reply"].as_str().unwrap().contains("sleep"));
}

#[tokio::test]
async fn test_chat_falls_back_after_auth_error() {
    let app = TestApp::with_providers(
        Subject::Chat,
        vec![ScriptedProvider::new(
            "gemini",
            vec![
                Err(ProviderError::Transport {
                    status: Some(401),
                    message: "bad key".to_string(),
                }),
            ],
        )],
    );

    let (status, body) = app
        .post_json("/api/ai-chat", json!({ "message": "Any tips for squats?" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "rule_based_fallback");
    assert!(!body["data"]["reply"].as_str().unwrap().is_empty());
}
