use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::goal::{CreateGoalRequest, WellnessGoal};

/// Create a goal, superseding any active goal of the same type: the old one
/// is deactivated, not deleted, in the same transaction.
pub async fn create_goal(
    db: &PgPool,
    user_id: Uuid,
    req: &CreateGoalRequest,
    now: DateTime<Utc>,
) -> AppResult<WellnessGoal> {
    let end_date = req.end_date.unwrap_or(now + Duration::days(30));

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        UPDATE wellness_goals SET is_active = FALSE, updated_at = NOW()
        WHERE user_id = $1 AND goal_type = $2 AND is_active = TRUE
        "#,
    )
    .bind(user_id)
    .bind(req.goal_type)
    .execute(&mut *tx)
    .await?;

    let goal = sqlx::query_as::<_, WellnessGoal>(
        r#"
        INSERT INTO wellness_goals (id, user_id, goal_type, target, period, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(req.goal_type)
    .bind(req.target)
    .bind(req.period)
    .bind(now)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(goal)
}

/// List goals newest first, optionally filtered by the active flag.
pub async fn list_goals(
    db: &PgPool,
    user_id: Uuid,
    is_active: Option<bool>,
) -> AppResult<Vec<WellnessGoal>> {
    let goals = sqlx::query_as::<_, WellnessGoal>(
        r#"
        SELECT * FROM wellness_goals
        WHERE user_id = $1 AND ($2::boolean IS NULL OR is_active = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(is_active)
    .fetch_all(db)
    .await?;

    Ok(goals)
}

pub async fn active_goals(db: &PgPool, user_id: Uuid) -> AppResult<Vec<WellnessGoal>> {
    list_goals(db, user_id, Some(true)).await
}
