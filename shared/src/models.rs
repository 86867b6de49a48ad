//! Domain models for generation requests
//!
//! Profile fields arrive from the mobile app in loosely-typed form. Everything
//! here parses leniently and falls back to documented defaults instead of
//! rejecting the request.

use crate::errors::FieldError;
use crate::validation::{
    validate_age, validate_calories, validate_height, validate_macro_grams, validate_weight,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalize a free-form enum string: lowercase, `-` and spaces become `_`
fn normalize_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

// ============================================================================
// Subject
// ============================================================================

/// Provider timeout tier, chosen by the endpoint that builds the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutClass {
    /// Full weekly plans
    Complex,
    /// Single recipe, chat turn or photo
    #[default]
    Simple,
}

/// What a generation request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Workout,
    MealPlan,
    Recipe,
    FoodAnalysis,
    Chat,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Workout,
        Subject::MealPlan,
        Subject::Recipe,
        Subject::FoodAnalysis,
        Subject::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Workout => "workout",
            Subject::MealPlan => "meal_plan",
            Subject::Recipe => "recipe",
            Subject::FoodAnalysis => "food_analysis",
            Subject::Chat => "chat",
        }
    }

    /// Whether the provider reply is expected to be JSON
    pub fn expects_json(&self) -> bool {
        !matches!(self, Subject::Chat)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Training level
// ============================================================================

/// Training experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum TrainingLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl TrainingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingLevel::Beginner => "beginner",
            TrainingLevel::Intermediate => "intermediate",
            TrainingLevel::Advanced => "advanced",
        }
    }

    /// Working sets per exercise for template plans
    pub fn default_sets(&self) -> u32 {
        match self {
            TrainingLevel::Beginner => 3,
            TrainingLevel::Intermediate => 4,
            TrainingLevel::Advanced => 5,
        }
    }
}

impl FromStr for TrainingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "beginner" | "novice" => Ok(TrainingLevel::Beginner),
            "intermediate" => Ok(TrainingLevel::Intermediate),
            "advanced" | "expert" => Ok(TrainingLevel::Advanced),
            other => Err(format!("Unknown training level: {}", other)),
        }
    }
}

impl From<String> for TrainingLevel {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for TrainingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Primary goal
// ============================================================================

/// Primary training goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PrimaryGoal {
    MuscleGain,
    FatLoss,
    Strength,
    Endurance,
    AthleticPerformance,
    #[default]
    GeneralFitness,
}

impl PrimaryGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryGoal::MuscleGain => "muscle_gain",
            PrimaryGoal::FatLoss => "fat_loss",
            PrimaryGoal::Strength => "strength",
            PrimaryGoal::Endurance => "endurance",
            PrimaryGoal::AthleticPerformance => "athletic_performance",
            PrimaryGoal::GeneralFitness => "general_fitness",
        }
    }

    /// Human-readable label, e.g. "Muscle Gain"
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryGoal::MuscleGain => "Muscle Gain",
            PrimaryGoal::FatLoss => "Fat Loss",
            PrimaryGoal::Strength => "Strength",
            PrimaryGoal::Endurance => "Endurance",
            PrimaryGoal::AthleticPerformance => "Athletic Performance",
            PrimaryGoal::GeneralFitness => "General Fitness",
        }
    }
}

impl FromStr for PrimaryGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "muscle_gain" | "hypertrophy" | "build_muscle" | "weight_gain" => {
                Ok(PrimaryGoal::MuscleGain)
            }
            "fat_loss" | "weight_loss" | "lose_weight" => Ok(PrimaryGoal::FatLoss),
            "strength" | "get_stronger" => Ok(PrimaryGoal::Strength),
            "endurance" => Ok(PrimaryGoal::Endurance),
            "athletic_performance" | "athletic" | "performance" => {
                Ok(PrimaryGoal::AthleticPerformance)
            }
            "general_fitness" | "maintenance" | "general" => Ok(PrimaryGoal::GeneralFitness),
            other => Err(format!("Unknown goal: {}", other)),
        }
    }
}

impl From<String> for PrimaryGoal {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for PrimaryGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Activity level
// ============================================================================

/// Daily activity level used for energy expenditure estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    #[default]
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    /// TDEE multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }
}

impl From<String> for ActivityLevel {
    fn from(s: String) -> Self {
        match normalize_token(&s).as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "lightly_active" | "light" => ActivityLevel::LightlyActive,
            "very_active" => ActivityLevel::VeryActive,
            "extremely_active" | "extra_active" => ActivityLevel::ExtremelyActive,
            _ => ActivityLevel::ModeratelyActive,
        }
    }
}

// ============================================================================
// Workout frequency
// ============================================================================

/// Raw frequency value as sent by clients, either `"4_5"` or `4`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawFrequency {
    Number(u32),
    Text(String),
}

/// Weekly workout frequency code such as `"3"` or `"4_5"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFrequency", into = "String")]
pub struct WorkoutFrequency(String);

impl WorkoutFrequency {
    /// Code used when the profile carries no frequency
    pub const DEFAULT_CODE: &'static str = "4_5";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Resolve the code to a concrete number of training days.
    ///
    /// Ranges always resolve to their upper bound (`"4_5"` is 5 days, never 4.5
    /// or 4). Unparseable codes resolve as the default code.
    pub fn days(&self) -> u8 {
        resolve_frequency_code(&self.0)
            .or_else(|| resolve_frequency_code(Self::DEFAULT_CODE))
            .unwrap_or(5)
    }
}

impl Default for WorkoutFrequency {
    fn default() -> Self {
        Self(Self::DEFAULT_CODE.to_string())
    }
}

impl From<RawFrequency> for WorkoutFrequency {
    fn from(raw: RawFrequency) -> Self {
        match raw {
            RawFrequency::Number(n) => Self(n.to_string()),
            RawFrequency::Text(s) => Self(s),
        }
    }
}

impl From<WorkoutFrequency> for String {
    fn from(freq: WorkoutFrequency) -> Self {
        freq.0
    }
}

/// Upper bound of a frequency code, clamped to 1..=7
fn resolve_frequency_code(code: &str) -> Option<u8> {
    let bound = code
        .trim()
        .split(|c| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .max()?;
    if bound == 0 {
        return None;
    }
    Some(bound.min(7) as u8)
}

// ============================================================================
// User profile
// ============================================================================

/// User profile as sent by the mobile app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "full_name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "weight", alias = "weight_kg")]
    pub weight_kg: Option<f64>,
    #[serde(default, alias = "height", alias = "height_cm")]
    pub height_cm: Option<f64>,
    #[serde(default, alias = "fitnessLevel", alias = "training_level")]
    pub training_level: Option<TrainingLevel>,
    #[serde(
        default,
        alias = "primary_goal",
        alias = "goal",
        alias = "fitness_strategy",
        alias = "goal_type"
    )]
    pub primary_goal: Option<PrimaryGoal>,
    #[serde(default, alias = "workout_frequency")]
    pub workout_frequency: Option<WorkoutFrequency>,
    #[serde(default, alias = "dietary_preferences")]
    pub dietary_preferences: Vec<String>,
    #[serde(default, alias = "activity_level")]
    pub activity_level: Option<ActivityLevel>,
}

impl UserProfile {
    /// Fill in defaults and drop out-of-range body metrics
    pub fn resolve(&self) -> ResolvedProfile {
        let frequency = self.workout_frequency.clone().unwrap_or_default();
        ResolvedProfile {
            full_name: self
                .full_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(ResolvedProfile::DEFAULT_NAME)
                .to_string(),
            age: self
                .age
                .filter(|a| validate_age(*a).is_ok())
                .unwrap_or(ResolvedProfile::DEFAULT_AGE),
            gender: self
                .gender
                .as_deref()
                .map(normalize_token)
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| ResolvedProfile::DEFAULT_GENDER.to_string()),
            weight_kg: self.weight_kg.filter(|w| validate_weight(*w).is_ok()),
            height_cm: self.height_cm.filter(|h| validate_height(*h).is_ok()),
            training_level: self.training_level.unwrap_or_default(),
            primary_goal: self.primary_goal.unwrap_or_default(),
            days_per_week: frequency.days(),
            frequency,
            dietary_preferences: self
                .dietary_preferences
                .iter()
                .map(|p| normalize_token(p))
                .filter(|p| !p.is_empty())
                .collect(),
            activity_level: self.activity_level.unwrap_or_default(),
        }
    }
}

/// Profile with every field filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProfile {
    pub full_name: String,
    pub age: u32,
    pub gender: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub training_level: TrainingLevel,
    pub primary_goal: PrimaryGoal,
    pub frequency: WorkoutFrequency,
    pub days_per_week: u8,
    pub dietary_preferences: Vec<String>,
    pub activity_level: ActivityLevel,
}

impl ResolvedProfile {
    pub const DEFAULT_NAME: &'static str = "Client";
    pub const DEFAULT_AGE: u32 = 30;
    pub const DEFAULT_GENDER: &'static str = "male";

    pub fn is_keto(&self) -> bool {
        self.dietary_preferences
            .iter()
            .any(|p| p == "keto" || p == "ketogenic")
    }

    /// Dietary style derived from preferences
    pub fn diet(&self) -> DietStyle {
        if self.dietary_preferences.iter().any(|p| p == "vegan") {
            DietStyle::Vegan
        } else if self
            .dietary_preferences
            .iter()
            .any(|p| p == "vegetarian" || p == "plant_based")
        {
            DietStyle::Vegetarian
        } else {
            DietStyle::Standard
        }
    }
}

impl Default for ResolvedProfile {
    fn default() -> Self {
        UserProfile::default().resolve()
    }
}

/// Meal template family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietStyle {
    Standard,
    Vegetarian,
    Vegan,
}

// ============================================================================
// Nutrition targets
// ============================================================================

/// Daily macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTargets {
    #[serde(alias = "daily_calories")]
    pub calories: f64,
    #[serde(alias = "protein", alias = "protein_grams")]
    pub protein_g: f64,
    #[serde(alias = "carbs", alias = "carbs_grams")]
    pub carbs_g: f64,
    #[serde(alias = "fat", alias = "fat_grams")]
    pub fat_g: f64,
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein_g: 150.0,
            carbs_g: 200.0,
            fat_g: 67.0,
        }
    }
}

impl NutritionTargets {
    /// Reject non-finite, negative or implausible values
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_calories(self.calories).map_err(|m| FieldError::new("targets.calories", m))?;
        validate_macro_grams(self.protein_g).map_err(|m| FieldError::new("targets.proteinG", m))?;
        validate_macro_grams(self.carbs_g).map_err(|m| FieldError::new("targets.carbsG", m))?;
        validate_macro_grams(self.fat_g).map_err(|m| FieldError::new("targets.fatG", m))?;
        Ok(())
    }

    /// Scale every macro by the same factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }
}

// ============================================================================
// Meal type
// ============================================================================

/// Meal slot within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MealType {
    Breakfast,
    #[default]
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl From<String> for MealType {
    fn from(s: String) -> Self {
        match normalize_token(&s).as_str() {
            "breakfast" => MealType::Breakfast,
            "dinner" => MealType::Dinner,
            "snack" | "snacks" => MealType::Snack,
            _ => MealType::Lunch,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Generation request
// ============================================================================

/// Decoded image attached to a food analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Subject-specific knobs for prompt composition
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub meal_type: Option<MealType>,
    pub ingredients: Vec<String>,
    pub strict: bool,
    pub message: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageInput>,
    pub seed: u64,
}

/// One generation call, built once per HTTP request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub subject: Subject,
    pub profile: ResolvedProfile,
    pub targets: Option<NutritionTargets>,
    pub options: GenerationOptions,
    pub timeout_class: TimeoutClass,
}

impl GenerationRequest {
    pub fn new(subject: Subject, profile: ResolvedProfile) -> Self {
        Self {
            subject,
            profile,
            targets: None,
            options: GenerationOptions::default(),
            timeout_class: TimeoutClass::default(),
        }
    }

    pub fn with_timeout_class(mut self, timeout_class: TimeoutClass) -> Self {
        self.timeout_class = timeout_class;
        self
    }

    pub fn with_targets(mut self, targets: Option<NutritionTargets>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}
