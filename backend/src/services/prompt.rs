//! Prompt composition
//!
//! Pure functions that turn a generation request into provider instructions.
//! The only randomness is the cuisine hint, drawn from an RNG seeded by the
//! request, so a given seed always yields the same prompt.

use gofitai_shared::{
    GenerationOptions, MealType, NutritionTargets, PrimaryGoal, ResolvedProfile, Subject,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::fmt::Write;

use super::fallback::MEAL_DISTRIBUTION;

/// Training prescription associated with a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalGuidance {
    pub rep_range: &'static str,
    pub rest_time: &'static str,
    pub intensity: &'static str,
    pub focus: &'static str,
}

pub fn goal_guidance(goal: PrimaryGoal) -> GoalGuidance {
    match goal {
        PrimaryGoal::MuscleGain => GoalGuidance {
            rep_range: "6-12",
            rest_time: "90-120s",
            intensity: "moderate to heavy",
            focus: "compound movements with progressive overload",
        },
        PrimaryGoal::FatLoss => GoalGuidance {
            rep_range: "12-15",
            rest_time: "60-90s",
            intensity: "moderate with higher volume",
            focus: "circuit training and supersets",
        },
        PrimaryGoal::AthleticPerformance => GoalGuidance {
            rep_range: "5-8",
            rest_time: "120-180s",
            intensity: "explosive and powerful",
            focus: "power and functional movements",
        },
        PrimaryGoal::Strength => GoalGuidance {
            rep_range: "3-6",
            rest_time: "150-180s",
            intensity: "heavy",
            focus: "low-rep compound lifts",
        },
        PrimaryGoal::Endurance => GoalGuidance {
            rep_range: "15-20",
            rest_time: "30-60s",
            intensity: "light to moderate",
            focus: "high-rep work and conditioning",
        },
        PrimaryGoal::GeneralFitness => GoalGuidance {
            rep_range: "8-12",
            rest_time: "90s",
            intensity: "moderate",
            focus: "balanced training with variety",
        },
    }
}

/// Recommended split for a number of weekly sessions
pub fn split_recommendation(days: u8) -> &'static str {
    match days {
        0 | 1 => "Full Body workout focusing on major compound movements",
        2 => "Upper/Lower split",
        3 => "Push/Pull/Legs split",
        4 => "Upper/Lower split repeated, or a 4-day Body Part split",
        5 => "Push/Pull/Legs/Upper/Lower, or a 5-day Body Part split",
        6 => "Push/Pull/Legs repeated twice, or a 6-day Body Part split",
        _ => "Push/Pull/Legs/Upper/Lower/Full Body/Active Recovery",
    }
}

const CUISINE_HINTS: [&str; 10] = [
    "Mediterranean",
    "Japanese",
    "Mexican",
    "Indian",
    "Thai",
    "Middle Eastern",
    "Korean",
    "Italian",
    "Greek",
    "Vietnamese",
];

/// Pick a cuisine hint from the seed
pub fn cuisine_hint(seed: u64) -> &'static str {
    let mut rng = StdRng::seed_from_u64(seed);
    CUISINE_HINTS.choose(&mut rng).copied().unwrap_or("Mediterranean")
}

/// Build the provider prompt for a request
pub fn compose(
    subject: Subject,
    profile: &ResolvedProfile,
    targets: Option<&NutritionTargets>,
    options: &GenerationOptions,
) -> String {
    match subject {
        Subject::Workout => workout_prompt(profile),
        Subject::MealPlan => meal_plan_prompt(profile, targets, options),
        Subject::Recipe => recipe_prompt(profile, targets, options),
        Subject::FoodAnalysis => food_analysis_prompt(options),
        Subject::Chat => chat_prompt(profile, options),
    }
}

fn profile_lines(profile: &ResolvedProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- Name: {}", profile.full_name);
    let _ = writeln!(out, "- Age: {}", profile.age);
    let _ = writeln!(out, "- Gender: {}", profile.gender);
    match profile.weight_kg {
        Some(w) => {
            let _ = writeln!(out, "- Weight: {:.1} kg", w);
        }
        None => out.push_str("- Weight: not specified\n"),
    }
    match profile.height_cm {
        Some(h) => {
            let _ = writeln!(out, "- Height: {:.0} cm", h);
        }
        None => out.push_str("- Height: not specified\n"),
    }
    let _ = writeln!(out, "- Training level: {}", profile.training_level);
    let _ = writeln!(out, "- Primary goal: {}", profile.primary_goal);
    out
}

fn workout_prompt(profile: &ResolvedProfile) -> String {
    let days = profile.days_per_week;
    let guidance = goal_guidance(profile.primary_goal);

    let mut prompt = String::new();
    prompt.push_str("You are an expert strength and conditioning coach. Create a weekly workout plan.\n\n");
    prompt.push_str("CLIENT PROFILE:\n");
    prompt.push_str(&profile_lines(profile));
    let _ = writeln!(prompt, "- Training days per week: {}", days);

    prompt.push_str("\nPROGRAMMING GUIDELINES:\n");
    let _ = writeln!(prompt, "- Split: {}", split_recommendation(days));
    let _ = writeln!(prompt, "- Rep range: {}", guidance.rep_range);
    let _ = writeln!(prompt, "- Rest between sets: {}", guidance.rest_time);
    let _ = writeln!(prompt, "- Intensity: {}", guidance.intensity);
    let _ = writeln!(prompt, "- Emphasis: {}", guidance.focus);
    prompt.push_str("- 4 to 7 exercises per session, compound movements first\n");

    let _ = write!(
        prompt,
        "\nREQUIREMENTS:\n\
         - The weekly_schedule array must contain EXACTLY {days} training days. Do not include rest days.\n\
         - Every day must list at least one exercise.\n\
         - Respond with JSON only, no markdown and no commentary.\n\n\
         JSON FORMAT:\n\
         {{\n  \"plan_name\": \"string\",\n  \"weekly_schedule\": [\n    {{\n      \"day\": \"Monday\",\n      \"focus\": \"Push\",\n      \"exercises\": [\n        {{ \"name\": \"Bench Press\", \"sets\": 4, \"reps\": \"{reps}\", \"rest_seconds\": 90, \"notes\": \"string\" }}\n      ]\n    }}\n  ]\n}}\n",
        days = days,
        reps = guidance.rep_range,
    );
    prompt
}

fn diet_line(profile: &ResolvedProfile) -> String {
    if profile.dietary_preferences.is_empty() {
        "none".to_string()
    } else {
        profile.dietary_preferences.join(", ")
    }
}

fn meal_plan_prompt(
    profile: &ResolvedProfile,
    targets: Option<&NutritionTargets>,
    options: &GenerationOptions,
) -> String {
    let targets = targets.copied().unwrap_or_default();
    let mut prompt = String::new();
    prompt.push_str("You are a registered dietitian. Create a one-day meal plan.\n\n");
    let _ = writeln!(
        prompt,
        "DAILY TARGETS: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
        targets.calories, targets.protein_g, targets.carbs_g, targets.fat_g
    );
    prompt.push_str("\nPER-MEAL TARGETS:\n");
    for (meal, share) in MEAL_DISTRIBUTION.iter() {
        let _ = writeln!(
            prompt,
            "- {}: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
            meal,
            targets.calories * share.calories,
            targets.protein_g * share.protein,
            targets.carbs_g * share.carbs,
            targets.fat_g * share.fat
        );
    }
    let _ = writeln!(prompt, "\nDIETARY PREFERENCES: {}", diet_line(profile));
    let _ = writeln!(
        prompt,
        "CUISINE INSPIRATION: draw on {} flavors for variety",
        cuisine_hint(options.seed)
    );
    prompt.push_str(
        "\nRespond with JSON only:\n\
         {\n  \"meals\": [\n    {\n      \"meal_type\": \"breakfast\",\n      \"recipe_name\": \"string\",\n      \"ingredients\": [\"string\"],\n      \"instructions\": [\"string\"],\n      \"macros\": { \"calories\": 0, \"protein_g\": 0, \"carbs_g\": 0, \"fat_g\": 0 }\n    }\n  ]\n}\n\
         Include breakfast, lunch, dinner and snack.\n",
    );
    prompt
}

fn recipe_prompt(
    profile: &ResolvedProfile,
    targets: Option<&NutritionTargets>,
    options: &GenerationOptions,
) -> String {
    let meal_type = options.meal_type.unwrap_or(MealType::Lunch);
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a professional chef and nutritionist. Create one {} recipe.",
        meal_type
    );
    if let Some(t) = targets {
        let _ = writeln!(
            prompt,
            "TARGET NUTRITION: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
            t.calories, t.protein_g, t.carbs_g, t.fat_g
        );
    }
    if !options.ingredients.is_empty() {
        let _ = writeln!(prompt, "INGREDIENTS: {}", options.ingredients.join(", "));
        if options.strict {
            prompt.push_str("Use ONLY the listed ingredients, plus water, salt, pepper and oil.\n");
        } else {
            prompt.push_str("Build the recipe around these ingredients; you may add others.\n");
        }
    }
    let _ = writeln!(prompt, "DIETARY PREFERENCES: {}", diet_line(profile));
    let _ = writeln!(prompt, "CUISINE INSPIRATION: {}", cuisine_hint(options.seed));
    prompt.push_str(
        "\nRespond with JSON only:\n\
         {\n  \"recipe_name\": \"string\",\n  \"prep_time\": 10,\n  \"cook_time\": 15,\n  \"servings\": 1,\n  \"difficulty\": \"easy|medium|hard\",\n  \"ingredients\": [{ \"name\": \"string\", \"quantity\": \"string\", \"calories\": 0, \"protein\": 0, \"carbs\": 0, \"fat\": 0 }],\n  \"instructions\": [\"string\"],\n  \"nutrition\": { \"calories\": 0, \"protein\": 0, \"carbs\": 0, \"fat\": 0, \"fiber\": 0, \"sugar\": 0, \"sodium\": 0 },\n  \"tips\": [\"string\"]\n}\n",
    );
    prompt
}

fn food_analysis_prompt(options: &GenerationOptions) -> String {
    let mut prompt = String::from(
        "Analyze the food in this image. Identify each item, estimate portion sizes and \
         the nutrition of the whole plate.\n",
    );
    if let Some(description) = options.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(prompt, "The user describes it as: \"{}\"", description.trim());
    }
    prompt.push_str(
        "\nRespond with JSON only:\n\
         {\n  \"foodName\": \"string\",\n  \"confidence\": 0-100,\n  \"estimatedServingSize\": \"string\",\n  \"totalNutrition\": { \"calories\": 0, \"protein\": 0, \"carbohydrates\": 0, \"fat\": 0, \"fiber\": 0, \"sugar\": 0, \"sodium\": 0 },\n  \"foodItems\": [{ \"name\": \"string\", \"quantity\": \"string\", \"calories\": 0, \"protein\": 0, \"carbohydrates\": 0, \"fat\": 0 }],\n  \"assumptions\": [\"string\"],\n  \"notes\": \"string\"\n}\n",
    );
    prompt
}

fn chat_prompt(profile: &ResolvedProfile, options: &GenerationOptions) -> String {
    let guidance = goal_guidance(profile.primary_goal);
    let mut prompt = String::from(
        "You are a friendly, evidence-based fitness and nutrition coach. \
         Answer concisely in plain text (no JSON). Avoid medical diagnoses.\n\n",
    );
    prompt.push_str("CLIENT PROFILE:\n");
    prompt.push_str(&profile_lines(profile));
    let _ = writeln!(
        prompt,
        "- Typical prescription: {} reps, {} rest, {}",
        guidance.rep_range, guidance.rest_time, guidance.intensity
    );
    let _ = write!(
        prompt,
        "\nCLIENT MESSAGE:\n{}\n",
        options.message.as_deref().unwrap_or("").trim()
    );
    prompt
}
