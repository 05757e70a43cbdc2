use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Duration;
use serde_json::json;

use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::connection::{ConnectRequest, ConnectionStatus, Provider, ProviderBody};
use crate::models::entry::{EntryPatch, Source};
use crate::response::ApiResponse;
use crate::store::{self, connections::NewConnection};
use crate::watch::{DailySummary, WatchError};
use crate::wellness::alerts::evaluate_entry;
use crate::AppState;

/// Connect (or reconnect) a provider. Fitbit exchanges an OAuth code for
/// tokens; Google Fit hands its tokens over directly. Either way the prior
/// connection for that provider is replaced wholesale.
pub async fn connect(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(provider): Path<Provider>,
    Json(body): Json<ConnectRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let now = state.clock.now();

    let new = match provider {
        Provider::Fitbit => {
            let code = body
                .code
                .as_deref()
                .ok_or_else(|| AppError::Validation("Authorization code is required".into()))?;
            let grant = state.watch.exchange_code(provider, code).await?;
            NewConnection {
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
                expires_at: grant.expires_in.map(|secs| now + Duration::seconds(secs)),
            }
        }
        Provider::GoogleFit => {
            let access_token = body
                .access_token
                .clone()
                .ok_or_else(|| AppError::Validation("Access token is required".into()))?;
            NewConnection {
                access_token,
                refresh_token: body.refresh_token.clone(),
                expires_at: body.expires_in.map(|secs| now + Duration::seconds(secs)),
            }
        }
        Provider::AppleHealth => {
            return Err(AppError::Validation(
                "apple-health connections are not supported yet".into(),
            ));
        }
    };

    let conn = store::connections::replace_connection(&state.db, auth_user.id, provider, new, now)
        .await?;

    tracing::info!(user_id = %auth_user.id, %provider, "Smartwatch connected");

    Ok(Json(ApiResponse::ok_with_message(
        format!("{provider} connected successfully"),
        json!({
            "provider": provider,
            "connected": true,
            "lastSync": conn.last_sync,
        }),
    )))
}

/// Pull yesterday's summary from the provider and fold it into that day's
/// entry. Reuses the entry upsert, so re-syncing the same day overwrites
/// rather than duplicates. `last_sync` moves only after the write lands.
pub async fn sync(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ProviderBody>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let provider = body.provider;

    let conn = store::connections::active_connection(&state.db, auth_user.id, provider)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{provider} not connected")))?;

    let now = state.clock.now();
    if conn.expires_at.is_some_and(|expires| expires <= now) {
        return Err(AppError::NotFound(format!(
            "{provider} connection expired, please reconnect"
        )));
    }

    let date = state.clock.yesterday();
    let summary = state
        .watch
        .daily_summary(provider, &conn.access_token, date)
        .await?;

    let patch = summary_patch(provider, &summary)?;

    let upserted = store::entries::upsert_entry(&state.db, auth_user.id, date, &patch).await?;

    let drafts = evaluate_entry(&upserted.entry);
    if !drafts.is_empty() {
        store::alerts::insert_alerts(&state.db, auth_user.id, &drafts, now).await?;
    }

    store::connections::touch_last_sync(&state.db, conn.id, now).await?;

    tracing::info!(user_id = %auth_user.id, %provider, %date, "Smartwatch sync completed");

    Ok(Json(ApiResponse::ok_with_message(
        format!("{provider} data synced successfully"),
        json!({
            "steps": summary.steps,
            "sleepHours": summary.sleep_hours,
            "heartRate": summary.heart_rate,
            "date": date,
        }),
    )))
}

pub async fn status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let connections = store::connections::list_connections(&state.db, auth_user.id).await?;
    let connections: Vec<ConnectionStatus> = connections.iter().map(Into::into).collect();

    Ok(Json(ApiResponse::ok(json!({ "connections": connections }))))
}

/// Idempotent: disconnecting a provider that was never connected still
/// reports success.
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ProviderBody>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let provider = body.provider;
    let removed = store::connections::remove_connection(&state.db, auth_user.id, provider).await?;

    if removed {
        tracing::info!(user_id = %auth_user.id, %provider, "Smartwatch disconnected");
    }

    Ok(Json(ApiResponse::message(format!(
        "{provider} disconnected successfully"
    ))))
}

/// Map a provider summary into an entry patch, rejecting values outside the
/// entry schema's ranges. A provider reporting 25 hours of sleep or a
/// resting heart rate of 300 is malformed upstream data, not a database
/// failure. A missing heart rate leaves any stored value alone.
fn summary_patch(provider: Provider, summary: &DailySummary) -> Result<EntryPatch, WatchError> {
    let patch = EntryPatch {
        steps: Some(summary.steps),
        sleep_hours: Some(summary.sleep_hours),
        heart_rate: summary.heart_rate.map(Some),
        source: Some(Source::Smartwatch),
        ..Default::default()
    };

    patch.validate().map_err(|errors| WatchError::Malformed {
        provider,
        detail: errors.to_string(),
    })?;

    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_summary_maps_to_a_smartwatch_patch() {
        let summary = DailySummary {
            steps: 8432,
            sleep_hours: 7.0,
            heart_rate: Some(58),
        };
        let patch = summary_patch(Provider::Fitbit, &summary).unwrap();
        assert_eq!(patch.steps, Some(8432));
        assert_eq!(patch.sleep_hours, Some(7.0));
        assert_eq!(patch.heart_rate, Some(Some(58)));
        assert_eq!(patch.source, Some(Source::Smartwatch));
    }

    #[test]
    fn impossible_sleep_total_is_rejected_as_malformed() {
        // 1500 minutes asleep from the provider maps to 25 hours
        let summary = DailySummary {
            steps: 4000,
            sleep_hours: 25.0,
            heart_rate: None,
        };
        assert!(matches!(
            summary_patch(Provider::Fitbit, &summary),
            Err(WatchError::Malformed { .. })
        ));
    }

    #[test]
    fn out_of_range_heart_rate_is_rejected_as_malformed() {
        let summary = DailySummary {
            steps: 4000,
            sleep_hours: 7.0,
            heart_rate: Some(300),
        };
        assert!(matches!(
            summary_patch(Provider::GoogleFit, &summary),
            Err(WatchError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_heart_rate_leaves_the_stored_value_alone() {
        let summary = DailySummary {
            steps: 4000,
            sleep_hours: 7.0,
            heart_rate: None,
        };
        let patch = summary_patch(Provider::Fitbit, &summary).unwrap();
        assert!(patch.heart_rate.is_none());
    }
}
