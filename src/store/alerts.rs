use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::alert::WellnessAlert;
use crate::wellness::alerts::AlertDraft;

/// Persist one alert row per draft. Alerts are write-once; nothing here
/// updates or removes earlier alerts for the same entry.
pub async fn insert_alerts(
    db: &PgPool,
    user_id: Uuid,
    drafts: &[AlertDraft],
    triggered_at: DateTime<Utc>,
) -> AppResult<()> {
    for draft in drafts {
        sqlx::query(
            r#"
            INSERT INTO wellness_alerts (id, user_id, alert_type, message, severity, triggered_at, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(draft.alert_type)
        .bind(&draft.message)
        .bind(draft.severity)
        .bind(triggered_at)
        .bind(Json(draft.data.clone()))
        .execute(db)
        .await?;
    }

    Ok(())
}

/// Newest unread alerts, capped for the dashboard.
pub async fn unread_alerts(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> AppResult<Vec<WellnessAlert>> {
    let alerts = sqlx::query_as::<_, WellnessAlert>(
        r#"
        SELECT * FROM wellness_alerts
        WHERE user_id = $1 AND is_read = FALSE
        ORDER BY triggered_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(alerts)
}

/// Mark one alert read. Idempotent: re-marking a read alert still succeeds.
/// 404 when the alert does not exist or belongs to someone else.
pub async fn mark_read(db: &PgPool, user_id: Uuid, alert_id: Uuid) -> AppResult<WellnessAlert> {
    sqlx::query_as::<_, WellnessAlert>(
        r#"
        UPDATE wellness_alerts SET is_read = TRUE
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(alert_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("Alert not found".into()))
}
