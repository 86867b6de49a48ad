//! Nutrition targets service
//!
//! Deterministic daily targets from body metrics. No provider is involved.

use super::fallback::{basal_metabolic_rate, estimate_targets};
use gofitai_shared::{
    DailyTargets, DietStyle, FoodSuggestions, MetabolicCalculations, MicronutrientTargets,
    NutritionPlan, PrimaryGoal, ResolvedProfile,
};

/// Build a targets-only nutrition plan, or `None` without weight and height
pub fn nutrition_plan(profile: &ResolvedProfile) -> Option<NutritionPlan> {
    let weight = profile.weight_kg?;
    let height = profile.height_cm?;
    let targets = estimate_targets(profile)?;

    let bmr = basal_metabolic_rate(&profile.gender, profile.age, weight, height);
    let tdee = bmr * profile.activity_level.multiplier();

    Some(NutritionPlan {
        plan_name: plan_name(profile),
        preferences: profile.dietary_preferences.clone(),
        metabolic_calculations: MetabolicCalculations {
            bmr_kcal_day: bmr.round(),
            tdee_kcal_day: tdee.round(),
            activity_level: profile.activity_level,
            strategy: profile.primary_goal,
            caloric_adjustment: caloric_adjustment(profile.primary_goal).to_string(),
        },
        daily_targets: DailyTargets {
            calories: targets.calories,
            protein_grams: targets.protein_g,
            carbs_grams: targets.carbs_g,
            fat_grams: targets.fat_g,
            fiber_grams: (targets.calories / 100.0).round(),
            water_liters: water_liters(weight),
        },
        micronutrients_targets: micronutrient_targets(&profile.gender, profile.age),
        food_suggestions: food_suggestions(profile.diet()),
    })
}

fn plan_name(profile: &ResolvedProfile) -> String {
    if profile.full_name == ResolvedProfile::DEFAULT_NAME {
        "Nutrition Plan".to_string()
    } else {
        format!("{}'s Nutrition Plan", profile.full_name)
    }
}

fn caloric_adjustment(goal: PrimaryGoal) -> &'static str {
    match goal {
        PrimaryGoal::FatLoss => "-15%",
        PrimaryGoal::MuscleGain => "+15%",
        _ => "0%",
    }
}

/// 35 ml per kg of body weight, to one decimal
pub fn water_liters(weight_kg: f64) -> f64 {
    (weight_kg * 0.35).round() / 10.0
}

pub fn micronutrient_targets(gender: &str, age: u32) -> MicronutrientTargets {
    let male = gender == "male";
    MicronutrientTargets {
        vitamin_c_mg: if male { 90 } else { 75 },
        vitamin_d_iu: 600,
        calcium_mg: if age < 50 { 1000 } else { 1200 },
        iron_mg: if male || age >= 50 { 8 } else { 18 },
        magnesium_mg: if male { 400 } else { 310 },
        zinc_mg: if male { 11 } else { 8 },
    }
}

fn food_suggestions(diet: DietStyle) -> FoodSuggestions {
    let protein: &[&str] = match diet {
        DietStyle::Vegan => &["tofu", "tempeh", "legumes", "quinoa", "nuts"],
        DietStyle::Vegetarian => &["eggs", "dairy", "legumes", "quinoa", "nuts"],
        DietStyle::Standard => &["chicken", "fish", "lean beef", "eggs", "legumes"],
    };
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();

    FoodSuggestions {
        protein_sources: owned(protein),
        carb_sources: owned(&["oats", "quinoa", "sweet potato", "brown rice", "fruits"]),
        fat_sources: owned(&["avocado", "nuts", "olive oil", "seeds"]),
        vegetables: owned(&["spinach", "broccoli", "bell peppers", "carrots", "tomatoes"]),
    }
}
