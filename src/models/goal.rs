use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: f64,
    pub current: f64,
    pub period: GoalPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "goal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Steps,
    Sleep,
    Study,
    Water,
    Exercise,
    Stress,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "goal_period", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    #[validate(range(min = 0.000001, message = "target must be positive"))]
    pub target: f64,
    pub period: GoalPeriod,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalQuery {
    pub is_active: Option<bool>,
}
