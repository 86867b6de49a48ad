//! Canonical plan shapes returned to the mobile app
//!
//! Every generation path (provider output or rule-based templates) converges on
//! one of these types. The mobile client and the plan store depend on them, so
//! they must stay structurally valid no matter where they came from.

use crate::models::{ActivityLevel, MealType, PrimaryGoal, TrainingLevel};
use serde::{Deserialize, Serialize};

/// Broad movement category of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    #[default]
    Compound,
    Isolation,
    Cardio,
}

/// One prescribed exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: String,
    pub rest_seconds: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: ExerciseCategory,
}

/// One training day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<Exercise>,
}

/// Weekly workout plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub plan_name: String,
    pub training_level: TrainingLevel,
    pub primary_goal: PrimaryGoal,
    pub sessions_per_week: u8,
    pub mesocycle_length_weeks: u8,
    pub estimated_time_per_session: String,
    pub weekly_schedule: Vec<WorkoutDay>,
}

impl WorkoutPlan {
    /// Length of a training block in weeks
    pub const MESOCYCLE_WEEKS: u8 = 8;

    /// Every day carries at least one exercise and the schedule matches the session count
    pub fn is_structurally_valid(&self) -> bool {
        !self.weekly_schedule.is_empty()
            && self.weekly_schedule.len() == self.sessions_per_week as usize
            && self
                .weekly_schedule
                .iter()
                .all(|d| !d.exercises.is_empty() && d.exercises.iter().all(|e| !e.name.is_empty()))
    }
}

/// Macro breakdown in grams plus energy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

/// One meal within a daily plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: MealType,
    pub recipe_name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub macros: Macros,
}

/// Daily meal plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub meals: Vec<Meal>,
    pub daily_totals: Macros,
}

impl MealPlan {
    /// Build a plan and compute its totals
    pub fn from_meals(meals: Vec<Meal>) -> Self {
        let daily_totals = meals.iter().fold(Macros::default(), |acc, m| acc + m.macros);
        Self { meals, daily_totals }
    }

    pub fn is_structurally_valid(&self) -> bool {
        !self.meals.is_empty() && self.meals.iter().all(|m| !m.recipe_name.is_empty())
    }
}

/// Ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Nutrition facts for a recipe or dish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl Default for RecipeNutrition {
    fn default() -> Self {
        Self {
            calories: 400.0,
            protein: 20.0,
            carbs: 30.0,
            fat: 15.0,
            fiber: 5.0,
            sugar: 8.0,
            sodium: 500.0,
        }
    }
}

/// A single recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_name: String,
    pub meal_type: MealType,
    pub prep_time: u32,
    pub cook_time: u32,
    pub total_time: u32,
    pub servings: u32,
    pub difficulty: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub nutrition: RecipeNutrition,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Recipe {
    pub fn is_structurally_valid(&self) -> bool {
        !self.recipe_name.is_empty() && !self.ingredients.is_empty()
    }
}

/// Nutrition estimate for a photographed dish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

/// Individual item recognized on the plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub quantity: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
}

/// Result of analyzing a food photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodAnalysis {
    pub food_name: String,
    pub confidence: u8,
    pub estimated_serving_size: String,
    pub nutrition: FoodNutrition,
    pub food_items: Vec<FoodItem>,
    pub assumptions: Vec<String>,
    pub notes: String,
}

/// Coaching chat reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

// ============================================================================
// Nutrition targets plan
// ============================================================================

/// Energy expenditure behind a nutrition plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetabolicCalculations {
    pub bmr_kcal_day: f64,
    pub tdee_kcal_day: f64,
    pub activity_level: ActivityLevel,
    pub strategy: PrimaryGoal,
    /// `-15%`, `+15%` or `0%`
    pub caloric_adjustment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTargets {
    pub calories: f64,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
    pub fiber_grams: f64,
    pub water_liters: f64,
}

/// Reference daily intakes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicronutrientTargets {
    pub vitamin_c_mg: u32,
    pub vitamin_d_iu: u32,
    pub calcium_mg: u32,
    pub iron_mg: u32,
    pub magnesium_mg: u32,
    pub zinc_mg: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSuggestions {
    pub protein_sources: Vec<String>,
    pub carb_sources: Vec<String>,
    pub fat_sources: Vec<String>,
    pub vegetables: Vec<String>,
}

/// Daily targets computed from body metrics. Targets only, no meals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    pub plan_name: String,
    pub preferences: Vec<String>,
    pub metabolic_calculations: MetabolicCalculations,
    pub daily_targets: DailyTargets,
    pub micronutrients_targets: MicronutrientTargets,
    pub food_suggestions: FoodSuggestions,
}

/// Canonical result of any generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedPlan {
    Workout(WorkoutPlan),
    MealPlan(MealPlan),
    Recipe(Recipe),
    FoodAnalysis(FoodAnalysis),
    Chat(ChatReply),
}

impl NormalizedPlan {
    pub fn is_structurally_valid(&self) -> bool {
        match self {
            NormalizedPlan::Workout(p) => p.is_structurally_valid(),
            NormalizedPlan::MealPlan(p) => p.is_structurally_valid(),
            NormalizedPlan::Recipe(r) => r.is_structurally_valid(),
            NormalizedPlan::FoodAnalysis(f) => !f.food_name.is_empty() && f.confidence <= 100,
            NormalizedPlan::Chat(c) => !c.reply.trim().is_empty(),
        }
    }

    pub fn as_workout(&self) -> Option<&WorkoutPlan> {
        match self {
            NormalizedPlan::Workout(p) => Some(p),
            _ => None,
        }
    }
}
