use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable once written; only `is_read` ever changes, and only false→true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub severity: AlertSeverity,
    pub is_read: bool,
    pub triggered_at: DateTime<Utc>,
    pub data: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowSteps,
    PoorSleep,
    HighStress,
    MissedStudy,
    LowWater,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "alert_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}
