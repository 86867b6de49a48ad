//! GoFitAI Shared Library
//!
//! This crate contains the request/response types, domain models and
//! canonical plan shapes shared by the backend and its tests.

pub mod errors;
pub mod models;
pub mod plan;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{
    ActivityLevel, DietStyle, GenerationOptions, GenerationRequest, ImageInput, MealType,
    NutritionTargets, PrimaryGoal, ResolvedProfile, Subject, TimeoutClass, TrainingLevel,
    UserProfile, WorkoutFrequency,
};
pub use plan::*;
pub use types::*;
