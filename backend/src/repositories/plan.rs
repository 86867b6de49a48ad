//! Workout plan persistence

use anyhow::Result;
use async_trait::async_trait;
use gofitai_shared::{PrimaryGoal, WorkoutPlan};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Storage for generated workout plans
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Replace the user's active plan and return the new plan id
    async fn upsert_workout_plan(&self, user_id: Uuid, plan: &WorkoutPlan, source: &str) -> Result<Uuid>;
}

/// Row payload understood by `upsert_ai_workout_plan`
pub fn plan_payload(plan: &WorkoutPlan, source: &str) -> Value {
    let goal_weight = |goal: PrimaryGoal| if plan.primary_goal == goal { 5 } else { 0 };
    json!({
        "name": plan.plan_name,
        "training_level": plan.training_level.as_str(),
        "primary_goal": plan.primary_goal.as_str(),
        "goal_fat_loss": goal_weight(PrimaryGoal::FatLoss),
        "goal_muscle_gain": goal_weight(PrimaryGoal::MuscleGain),
        "workout_frequency": plan.sessions_per_week.to_string(),
        "mesocycle_length_weeks": plan.mesocycle_length_weeks,
        "estimated_time_per_session": plan.estimated_time_per_session,
        "weeklySchedule": plan.weekly_schedule,
        "source": source,
    })
}

/// PostgreSQL-backed plan store
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanRepository {
    async fn upsert_workout_plan(&self, user_id: Uuid, plan: &WorkoutPlan, source: &str) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let plan_id: Uuid = sqlx::query_scalar(r#"SELECT upsert_ai_workout_plan($1, $2::jsonb)"#)
            .bind(user_id)
            .bind(Json(plan_payload(plan, source)))
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE workout_plans
            SET status = 'active', is_active = true, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(plan_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(plan_id)
    }
}
