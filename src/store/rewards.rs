use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::reward::{RewardCategory, UserReward};
use crate::wellness::streak::StreakMilestone;

/// Grant every milestone the streak has reached. The `(user_id, code)` unique
/// constraint makes repeat grants a no-op.
pub async fn grant_streak_milestones(
    db: &PgPool,
    user_id: Uuid,
    milestones: &[StreakMilestone],
) -> AppResult<()> {
    for milestone in milestones {
        sqlx::query(
            r#"
            INSERT INTO user_rewards (id, user_id, code, name, description, icon, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(milestone.code)
        .bind(milestone.name)
        .bind(milestone.description)
        .bind(milestone.icon)
        .bind(RewardCategory::Streak)
        .execute(db)
        .await?;
    }

    Ok(())
}

pub async fn recent_rewards(db: &PgPool, user_id: Uuid, limit: i64) -> AppResult<Vec<UserReward>> {
    let rewards = sqlx::query_as::<_, UserReward>(
        r#"
        SELECT * FROM user_rewards
        WHERE user_id = $1
        ORDER BY earned_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rewards)
}
