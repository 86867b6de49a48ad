//! Shape normalization
//!
//! Providers return the same information under many spellings:
//! `weeklySchedule` vs `weekly_schedule` vs `days`, bare arrays, a single day
//! on its own, legacy warm-up/main/cool-down sections. Everything here maps
//! those variants onto the canonical plan types and fills sensible defaults.

use super::parser::ParseError;
use super::prompt::goal_guidance;
use gofitai_shared::{
    ChatReply, Exercise, ExerciseCategory, FoodAnalysis, FoodItem, FoodNutrition, Macros, Meal,
    MealPlan, MealType, NormalizedPlan, Recipe, RecipeIngredient, RecipeNutrition,
    ResolvedProfile, Subject, WorkoutDay, WorkoutPlan,
};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::{Map, Value};

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Focus rotation for days added to short schedules
pub const PADDING_FOCUS: [&str; 7] = [
    "Upper Body",
    "Lower Body",
    "Push",
    "Pull",
    "Legs",
    "Full Body",
    "Core & Cardio",
];

const SCHEDULE_KEYS: [&str; 5] = ["weekly_schedule", "weeklySchedule", "days", "week", "schedule"];
const PLAN_WRAPPERS: [&str; 3] = ["plan", "workoutPlan", "workout_plan"];
const MEAL_KEYS: [&str; 5] = ["meals", "meal_plan", "mealPlan", "daily_meal_plan", "dailyMealPlan"];

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// What the caller expects the response to contain
#[derive(Debug, Clone, Copy)]
pub struct ExpectedShape<'a> {
    pub subject: Subject,
    pub profile: &'a ResolvedProfile,
    pub meal_type: Option<MealType>,
}

impl<'a> ExpectedShape<'a> {
    pub fn new(subject: Subject, profile: &'a ResolvedProfile) -> Self {
        Self {
            subject,
            profile,
            meal_type: None,
        }
    }

    pub fn with_meal_type(mut self, meal_type: Option<MealType>) -> Self {
        self.meal_type = meal_type;
        self
    }
}

/// Map a parsed JSON value onto the canonical shape for the subject
pub fn normalize(value: Value, expected: &ExpectedShape<'_>) -> Result<NormalizedPlan, ParseError> {
    match expected.subject {
        Subject::Workout => normalize_workout(&value, expected.profile).map(NormalizedPlan::Workout),
        Subject::MealPlan => normalize_meal_plan(&value).map(NormalizedPlan::MealPlan),
        Subject::Recipe => {
            normalize_recipe(&value, expected.meal_type).map(NormalizedPlan::Recipe)
        }
        Subject::FoodAnalysis => normalize_food_analysis(&value).map(NormalizedPlan::FoodAnalysis),
        Subject::Chat => normalize_chat(&value).map(NormalizedPlan::Chat),
    }
}

// ============================================================================
// Value helpers
// ============================================================================

fn field<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Numbers, or the first number inside a string like `"350 kcal"`
fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(number_value))
        .filter(|n| n.is_finite() && *n >= 0.0)
}

fn string_list(value: Option<&Value>, object_keys: &[&str]) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(o) => text_field(o, object_keys),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Workout
// ============================================================================

/// Category by keyword; unknown movements count as compound
pub fn exercise_category(name: &str) -> ExerciseCategory {
    const COMPOUND: [&str; 6] = ["bench press", "squat", "deadlift", "row", "pull-up", "overhead press"];
    const ISOLATION: [&str; 5] = ["curl", "extension", "fly", "raise", "cable"];
    const CARDIO: [&str; 4] = ["run", "bike", "jump", "burpee"];

    let name = name.to_lowercase();
    if COMPOUND.iter().any(|k| name.contains(k)) {
        ExerciseCategory::Compound
    } else if ISOLATION.iter().any(|k| name.contains(k)) {
        ExerciseCategory::Isolation
    } else if CARDIO.iter().any(|k| name.contains(k)) {
        ExerciseCategory::Cardio
    } else {
        ExerciseCategory::Compound
    }
}

/// Rest period in seconds from `90`, `"90s"`, `"2 min"` or `"60-90 seconds"`
pub fn parse_rest_seconds(value: &Value) -> Option<u32> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let n: f64 = NUMBER.find(s)?.as_str().parse().ok()?;
            if s.to_lowercase().contains("min") {
                n * 60.0
            } else {
                n
            }
        }
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then(|| seconds.round() as u32)
}

/// Three generic exercises for a day that came back empty
pub fn placeholder_exercises(focus: &str) -> Vec<Exercise> {
    let make = |name: String, sets: u32, reps: &str, rest: u32, notes: &str| Exercise {
        category: exercise_category(&name),
        name,
        sets,
        reps: reps.to_string(),
        rest_seconds: rest,
        notes: notes.to_string(),
    };
    vec![
        make(
            format!("{} - Primary Compound", focus),
            4,
            "8-12",
            90,
            "Main lift of the session; leave 1-2 reps in reserve",
        ),
        make(
            "Secondary Movement".to_string(),
            3,
            "10-15",
            60,
            "Controlled tempo",
        ),
        make("Accessory Work".to_string(), 3, "12-15", 45, "Focus on form"),
    ]
}

/// Session length estimate from the average exercise count
pub fn estimate_session_time(days: &[WorkoutDay]) -> String {
    if days.is_empty() {
        return "45-60 min".to_string();
    }
    let total: usize = days.iter().map(|d| d.exercises.len()).sum();
    let average = total as f64 / days.len() as f64;
    if average <= 5.0 {
        "45-60 min"
    } else if average <= 7.0 {
        "60-75 min"
    } else {
        "75-90 min"
    }
    .to_string()
}

fn looks_like_day(value: &Value) -> bool {
    value.as_object().map_or(false, |o| {
        ["day", "exercises", "focus", "day_name", "main_workout"]
            .iter()
            .any(|k| o.contains_key(*k))
    })
}

/// Find the array of day objects, wherever the provider put it
fn locate_schedule(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) if items.iter().any(looks_like_day) => return Some(items.clone()),
        Value::Object(_) => {}
        _ => return None,
    }

    let root = value.as_object()?;
    let containers = std::iter::once(root)
        .chain(PLAN_WRAPPERS.iter().filter_map(|w| root.get(*w)?.as_object()));
    for container in containers {
        for key in SCHEDULE_KEYS {
            if let Some(Value::Array(days)) = container.get(key) {
                if !days.is_empty() {
                    return Some(days.clone());
                }
            }
        }
    }

    if root.get("exercises").map_or(false, Value::is_array) {
        return Some(vec![value.clone()]);
    }

    root.values().find_map(|v| match v {
        Value::Array(items) if items.first().map_or(false, looks_like_day) => Some(items.clone()),
        _ => None,
    })
}

fn plan_name(value: &Value) -> Option<String> {
    let root = value.as_object()?;
    const NAME_KEYS: [&str; 3] = ["plan_name", "planName", "title"];
    text_field(root, &NAME_KEYS).or_else(|| {
        PLAN_WRAPPERS
            .iter()
            .filter_map(|w| root.get(*w)?.as_object())
            .find_map(|o| text_field(o, &NAME_KEYS))
    })
}

fn normalize_exercise(value: &Value, profile: &ResolvedProfile) -> Option<Exercise> {
    let guidance = goal_guidance(profile.primary_goal);
    let obj = match value {
        Value::String(name) if !name.trim().is_empty() => {
            let name = name.trim().to_string();
            return Some(Exercise {
                category: exercise_category(&name),
                name,
                sets: 3,
                reps: guidance.rep_range.to_string(),
                rest_seconds: 90,
                notes: String::new(),
            });
        }
        Value::Object(o) => o,
        _ => return None,
    };

    let name = text_field(obj, &["name", "exercise", "exercise_name", "exerciseName", "title"])?;
    let sets = number_field(obj, &["sets", "set_count"])
        .map(|s| (s.round() as u32).clamp(1, 10))
        .unwrap_or(3);
    let reps = text_field(obj, &["reps", "repetitions", "rep_range", "duration"])
        .unwrap_or_else(|| guidance.rep_range.to_string());
    let rest_seconds = field(obj, &["rest_seconds", "restSeconds", "rest", "rest_time", "rest_period"])
        .and_then(parse_rest_seconds)
        .unwrap_or(90);
    let notes = match field(obj, &["notes", "instructions", "tips", "form_cues"]) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v @ Value::Array(_)) => string_list(Some(v), &["text"]).join(" "),
        _ => String::new(),
    };
    let category = match text_field(obj, &["category"]).as_deref().map(str::to_lowercase).as_deref() {
        Some("compound") => ExerciseCategory::Compound,
        Some("isolation") => ExerciseCategory::Isolation,
        Some("cardio") => ExerciseCategory::Cardio,
        _ => exercise_category(&name),
    };

    Some(Exercise {
        name,
        sets,
        reps,
        rest_seconds,
        notes,
        category,
    })
}

fn normalize_day(value: &Value, index: usize, profile: &ResolvedProfile) -> Option<WorkoutDay> {
    let obj = value.as_object()?;

    let day = match field(obj, &["day", "day_name", "dayName"]) {
        Some(Value::Number(n)) => {
            let n = n.as_u64().unwrap_or(1).max(1) as usize;
            DAY_NAMES[(n - 1) % 7].to_string()
        }
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DAY_NAMES[index % 7].to_string(),
    };
    let focus = text_field(obj, &["focus", "workout_type", "workoutType", "type", "title"])
        .unwrap_or_else(|| "Full Body".to_string());

    let sources: Vec<&Value> = match obj.get("exercises") {
        Some(Value::Array(items)) => items.iter().collect(),
        _ => ["warm_up", "main_workout", "cool_down"]
            .iter()
            .filter_map(|k| obj.get(*k)?.as_array())
            .flatten()
            .collect(),
    };
    let mut exercises: Vec<Exercise> = sources
        .into_iter()
        .filter_map(|e| normalize_exercise(e, profile))
        .collect();

    if exercises.is_empty() && !is_rest_focus(&focus) {
        exercises = placeholder_exercises(&focus);
    }

    Some(WorkoutDay {
        day,
        focus,
        exercises,
    })
}

fn is_rest_focus(focus: &str) -> bool {
    focus.to_lowercase().contains("rest")
}

/// Trim or pad the schedule to exactly `expected` days
pub fn enforce_day_count(days: &mut Vec<WorkoutDay>, expected: usize) {
    days.truncate(expected);
    let mut slot = 0;
    while days.len() < expected {
        let index = days.len();
        let day = DAY_NAMES
            .iter()
            .cycle()
            .skip(slot)
            .take(7)
            .find(|name| !days.iter().any(|d| d.day.eq_ignore_ascii_case(name)))
            .copied()
            .unwrap_or(DAY_NAMES[index % 7]);
        slot += 1;
        let focus = PADDING_FOCUS[index % PADDING_FOCUS.len()];
        days.push(WorkoutDay {
            day: day.to_string(),
            focus: focus.to_string(),
            exercises: placeholder_exercises(focus),
        });
    }
}

fn normalize_workout(value: &Value, profile: &ResolvedProfile) -> Result<WorkoutPlan, ParseError> {
    let raw_days = locate_schedule(value)
        .ok_or_else(|| ParseError::Shape("no workout schedule found".to_string()))?;

    let mut days: Vec<WorkoutDay> = raw_days
        .iter()
        .enumerate()
        .filter_map(|(i, d)| normalize_day(d, i, profile))
        .filter(|d| !is_rest_focus(&d.focus))
        .collect();
    if days.is_empty() {
        return Err(ParseError::Shape("schedule contains no training days".to_string()));
    }

    let expected = profile.days_per_week as usize;
    enforce_day_count(&mut days, expected);

    Ok(WorkoutPlan {
        plan_name: plan_name(value).unwrap_or_else(|| {
            format!(
                "{} {} Plan",
                title_case(profile.training_level.as_str()),
                profile.primary_goal.label()
            )
        }),
        training_level: profile.training_level,
        primary_goal: profile.primary_goal,
        sessions_per_week: profile.days_per_week,
        mesocycle_length_weeks: WorkoutPlan::MESOCYCLE_WEEKS,
        estimated_time_per_session: estimate_session_time(&days),
        weekly_schedule: days,
    })
}

// ============================================================================
// Meal plan
// ============================================================================

fn macros_from(obj: &Map<String, Value>) -> Macros {
    let source = field(obj, &["macros", "nutrition", "macronutrients"])
        .and_then(Value::as_object)
        .unwrap_or(obj);
    Macros {
        calories: number_field(source, &["calories", "kcal", "energy"]).unwrap_or(0.0),
        protein_g: number_field(source, &["protein_g", "protein", "protein_grams", "proteinG"])
            .unwrap_or(0.0),
        carbs_g: number_field(
            source,
            &["carbs_g", "carbs", "carbohydrates", "carbs_grams", "carbsG"],
        )
        .unwrap_or(0.0),
        fat_g: number_field(source, &["fat_g", "fat", "fats", "fat_grams", "fatG"]).unwrap_or(0.0),
    }
}

fn ingredient_line(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(o) => {
            let name = text_field(o, &["name", "item", "ingredient"])?;
            match text_field(o, &["quantity", "amount"]) {
                Some(qty) => Some(format!("{} {}", qty, name)),
                None => Some(name),
            }
        }
        _ => None,
    }
}

fn normalize_meal(value: &Value, index: usize, slot: Option<MealType>) -> Option<Meal> {
    let obj = value.as_object()?;
    let recipe_name = text_field(obj, &["recipe_name", "recipeName", "name", "title", "meal_name", "meal"])?;
    let meal_type = text_field(obj, &["meal_type", "mealType", "type", "time_slot"])
        .map(MealType::from)
        .or(slot)
        .unwrap_or(MealType::ALL[index % MealType::ALL.len()]);
    let ingredients = match obj.get("ingredients") {
        Some(Value::Array(items)) => items.iter().filter_map(ingredient_line).collect(),
        other => string_list(other, &["name"]),
    };
    let instructions = string_list(
        field(obj, &["instructions", "steps", "directions"]),
        &["step", "text", "instruction"],
    );

    Some(Meal {
        meal_type,
        recipe_name,
        ingredients,
        instructions,
        macros: macros_from(obj),
    })
}

fn normalize_meal_plan(value: &Value) -> Result<MealPlan, ParseError> {
    let meals = locate_meals(value)
        .ok_or_else(|| ParseError::Shape("no meals found".to_string()))?;
    if meals.is_empty() {
        return Err(ParseError::Shape("meal list is empty".to_string()));
    }
    Ok(MealPlan::from_meals(meals))
}

fn meals_from_array(items: &[Value]) -> Vec<Meal> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, m)| normalize_meal(m, i, None))
        .collect()
}

/// Object keyed by meal slot: `{"breakfast": {...}, "lunch": {...}}`
fn meals_by_slot(obj: &Map<String, Value>) -> Vec<Meal> {
    MealType::ALL
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| normalize_meal(obj.get(slot.as_str())?, i, Some(*slot)))
        .collect()
}

fn locate_meals(value: &Value) -> Option<Vec<Meal>> {
    let obj = match value {
        Value::Array(items) => return Some(meals_from_array(items)),
        Value::Object(o) => o,
        _ => return None,
    };

    for key in MEAL_KEYS {
        match obj.get(key) {
            Some(Value::Array(items)) => return Some(meals_from_array(items)),
            Some(Value::Object(inner)) => {
                if let Some(Value::Array(items)) = inner.get("meals") {
                    return Some(meals_from_array(items));
                }
                let by_slot = meals_by_slot(inner);
                if !by_slot.is_empty() {
                    return Some(by_slot);
                }
            }
            _ => {}
        }
    }

    let by_slot = meals_by_slot(obj);
    if !by_slot.is_empty() {
        return Some(by_slot);
    }

    normalize_meal(value, 0, None).map(|m| vec![m])
}

// ============================================================================
// Recipe
// ============================================================================

fn normalize_ingredient(value: &Value) -> Option<RecipeIngredient> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(RecipeIngredient {
            name: s.trim().to_string(),
            quantity: "1 serving".to_string(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        }),
        Value::Object(o) => Some(RecipeIngredient {
            name: text_field(o, &["name", "item", "ingredient"]).unwrap_or_else(|| "Ingredient".to_string()),
            quantity: text_field(o, &["quantity", "amount"]).unwrap_or_else(|| "1 serving".to_string()),
            calories: number_field(o, &["calories"]).unwrap_or(0.0),
            protein: number_field(o, &["protein", "protein_g"]).unwrap_or(0.0),
            carbs: number_field(o, &["carbs", "carbohydrates", "carbs_g"]).unwrap_or(0.0),
            fat: number_field(o, &["fat", "fat_g"]).unwrap_or(0.0),
        }),
        _ => None,
    }
}

/// Positive number or the default, mirroring `value || default`
fn or_default(obj: &Map<String, Value>, keys: &[&str], default: f64) -> f64 {
    number_field(obj, keys).filter(|n| *n > 0.0).unwrap_or(default)
}

fn normalize_recipe(value: &Value, requested: Option<MealType>) -> Result<Recipe, ParseError> {
    let root = value
        .as_object()
        .ok_or_else(|| ParseError::Shape("recipe must be an object".to_string()))?;
    let obj = root.get("recipe").and_then(Value::as_object).unwrap_or(root);

    let name = text_field(obj, &["recipe_name", "recipeName", "name", "title"]);
    let ingredients: Vec<RecipeIngredient> = obj
        .get("ingredients")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_ingredient).collect())
        .unwrap_or_default();
    if name.is_none() && ingredients.is_empty() {
        return Err(ParseError::Shape("no recipe name or ingredients".to_string()));
    }
    if ingredients.is_empty() {
        return Err(ParseError::Shape("recipe has no ingredients".to_string()));
    }

    let prep_time = or_default(obj, &["prep_time", "prepTime"], 10.0).max(5.0) as u32;
    let cook_time = or_default(obj, &["cook_time", "cookTime"], 15.0) as u32;
    let total_time = number_field(obj, &["total_time", "totalTime"])
        .filter(|n| *n > 0.0)
        .map(|n| n as u32)
        .unwrap_or(prep_time + cook_time);
    let servings = or_default(obj, &["servings"], 1.0).max(1.0) as u32;
    let difficulty = match text_field(obj, &["difficulty"]).map(|d| d.to_lowercase()).as_deref() {
        Some(d @ ("easy" | "medium" | "hard")) => d.to_string(),
        _ => "medium".to_string(),
    };
    let meal_type = text_field(obj, &["meal_type", "mealType"])
        .map(MealType::from)
        .or(requested)
        .unwrap_or_default();

    let defaults = RecipeNutrition::default();
    let nutrition = match obj.get("nutrition").and_then(Value::as_object) {
        Some(n) => RecipeNutrition {
            calories: or_default(n, &["calories"], defaults.calories),
            protein: or_default(n, &["protein", "protein_g"], defaults.protein),
            carbs: or_default(n, &["carbs", "carbohydrates", "carbs_g"], defaults.carbs),
            fat: or_default(n, &["fat", "fat_g"], defaults.fat),
            fiber: or_default(n, &["fiber"], defaults.fiber),
            sugar: or_default(n, &["sugar"], defaults.sugar),
            sodium: or_default(n, &["sodium"], defaults.sodium),
        },
        None => defaults,
    };

    Ok(Recipe {
        recipe_name: name.unwrap_or_else(|| "Generated Recipe".to_string()),
        meal_type,
        prep_time,
        cook_time,
        total_time,
        servings,
        difficulty,
        ingredients,
        instructions: string_list(field(obj, &["instructions", "steps"]), &["step", "text"]),
        nutrition,
        tips: string_list(obj.get("tips"), &["text"]),
    })
}

// ============================================================================
// Food analysis
// ============================================================================

fn normalize_food_analysis(value: &Value) -> Result<FoodAnalysis, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::Shape("analysis must be an object".to_string()))?;
    let food_name = text_field(obj, &["foodName", "food_name", "dishName", "dish_name", "name"])
        .ok_or_else(|| ParseError::Shape("no food name".to_string()))?;

    let confidence = number_field(obj, &["confidence", "confidence_score"])
        .map(|c| if c <= 1.0 { c * 100.0 } else { c })
        .map(|c| c.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(75);

    let n = field(obj, &["totalNutrition", "total_nutrition", "nutrition"])
        .and_then(Value::as_object)
        .unwrap_or(obj);
    let nutrition = FoodNutrition {
        calories: number_field(n, &["calories", "kcal"]).unwrap_or(0.0),
        protein: number_field(n, &["protein"]).unwrap_or(0.0),
        carbohydrates: number_field(n, &["carbohydrates", "carbs"]).unwrap_or(0.0),
        fat: number_field(n, &["fat"]).unwrap_or(0.0),
        fiber: number_field(n, &["fiber"]).unwrap_or(0.0),
        sugar: number_field(n, &["sugar"]).unwrap_or(0.0),
        sodium: number_field(n, &["sodium"]).unwrap_or(0.0),
    };

    let food_items = field(obj, &["foodItems", "food_items", "items"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|item| {
                    Some(FoodItem {
                        name: text_field(item, &["name"])?,
                        quantity: text_field(item, &["quantity", "amount", "portion"])
                            .unwrap_or_else(|| "1 serving".to_string()),
                        calories: number_field(item, &["calories"]).unwrap_or(0.0),
                        protein: number_field(item, &["protein"]).unwrap_or(0.0),
                        carbohydrates: number_field(item, &["carbohydrates", "carbs"]).unwrap_or(0.0),
                        fat: number_field(item, &["fat"]).unwrap_or(0.0),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(FoodAnalysis {
        food_name,
        confidence,
        estimated_serving_size: text_field(obj, &["estimatedServingSize", "estimated_serving_size", "servingSize"])
            .unwrap_or_else(|| "1 serving".to_string()),
        nutrition,
        food_items,
        assumptions: string_list(obj.get("assumptions"), &["text"]),
        notes: text_field(obj, &["notes"]).unwrap_or_default(),
    })
}

// ============================================================================
// Chat
// ============================================================================

fn normalize_chat(value: &Value) -> Result<ChatReply, ParseError> {
    value
        .as_object()
        .and_then(|o| text_field(o, &["reply", "response", "message", "answer", "text"]))
        .map(|reply| ChatReply { reply })
        .ok_or_else(|| ParseError::Shape("no reply text".to_string()))
}
