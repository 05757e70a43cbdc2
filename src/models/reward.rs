use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: RewardCategory,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "reward_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RewardCategory {
    Streak,
    Achievement,
    Milestone,
}
