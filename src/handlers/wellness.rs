use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::alert::WellnessAlert;
use crate::models::entry::{AddEntryRequest, DashboardQuery, HistoryQuery, WellnessEntry};
use crate::models::goal::{CreateGoalRequest, GoalQuery, WellnessGoal};
use crate::models::reward::UserReward;
use crate::response::ApiResponse;
use crate::store;
use crate::wellness::alerts::evaluate_entry;
use crate::wellness::stats::{compute_stats, GoalTargets, PeriodStats};
use crate::wellness::streak::{current_streak, milestones_reached};
use crate::AppState;

/// Window the streak scan looks back over. Anything older cannot extend a
/// streak that ends today.
const STREAK_LOOKBACK_DAYS: i64 = 366;

pub async fn add_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<AddEntryRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let date = body
        .date
        .ok_or_else(|| AppError::Validation("Date is required".into()))?;
    body.patch.validate()?;

    let upserted = store::entries::upsert_entry(&state.db, auth_user.id, date, &body.patch).await?;

    let drafts = evaluate_entry(&upserted.entry);
    if !drafts.is_empty() {
        store::alerts::insert_alerts(&state.db, auth_user.id, &drafts, state.clock.now()).await?;
    }

    refresh_streak_rewards(&state, auth_user.id).await?;

    let message = if upserted.created {
        "Wellness data added successfully"
    } else {
        "Wellness data updated successfully"
    };

    Ok(Json(ApiResponse::ok_with_message(
        message,
        json!({ "wellnessEntry": upserted.entry }),
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    period: String,
    date_range: DateRange,
    wellness_entries: Vec<WellnessEntry>,
    stats: PeriodStats,
    goals: Vec<WellnessGoal>,
    alerts: Vec<WellnessAlert>,
    current_streak: i32,
    recent_rewards: Vec<UserReward>,
}

/// One round trip for the dashboard screen: entries for the window, stats,
/// active goals, unread alerts, streak, and recent rewards.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<DashboardData>>> {
    let days = query.period_days();
    let end_date = state.clock.today();
    let start_date = end_date - Duration::days(days);

    let entries = store::entries::query_range(&state.db, auth_user.id, start_date, end_date).await?;
    let goals = store::goals::active_goals(&state.db, auth_user.id).await?;
    let alerts = store::alerts::unread_alerts(&state.db, auth_user.id, 5).await?;

    let targets = GoalTargets::from_active_goals(&goals);
    let stats = compute_stats(&entries, &targets);

    let dates = store::entries::entry_dates_since(
        &state.db,
        auth_user.id,
        end_date - Duration::days(STREAK_LOOKBACK_DAYS),
    )
    .await?;
    let streak = current_streak(&dates, end_date);

    let recent_rewards = store::rewards::recent_rewards(&state.db, auth_user.id, 5).await?;

    Ok(Json(ApiResponse::ok(DashboardData {
        period: format!("{days}d"),
        date_range: DateRange {
            start_date,
            end_date,
        },
        wellness_entries: entries,
        stats,
        goals,
        alerts,
        current_streak: streak,
        recent_rewards,
    })))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let entries = store::entries::history(
        &state.db,
        auth_user.id,
        query.start_date,
        query.end_date,
        limit,
    )
    .await?;

    Ok(Json(ApiResponse::ok(json!({ "wellnessEntries": entries }))))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateGoalRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    body.validate()?;

    let goal = store::goals::create_goal(&state.db, auth_user.id, &body, state.clock.now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Wellness goal created successfully",
            json!({ "goal": goal }),
        )),
    ))
}

pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GoalQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let goals = store::goals::list_goals(&state.db, auth_user.id, query.is_active).await?;

    Ok(Json(ApiResponse::ok(json!({ "goals": goals }))))
}

pub async fn mark_alert_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let alert = store::alerts::mark_read(&state.db, auth_user.id, alert_id).await?;

    Ok(Json(ApiResponse::ok_with_message(
        "Alert marked as read",
        json!({ "alert": alert }),
    )))
}

/// Recompute the streak ending today and grant any milestone rewards it has
/// reached. Grants are keyed on (user, code), so repeats are no-ops.
async fn refresh_streak_rewards(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let today = state.clock.today();
    let dates = store::entries::entry_dates_since(
        &state.db,
        user_id,
        today - Duration::days(STREAK_LOOKBACK_DAYS),
    )
    .await?;

    let streak = current_streak(&dates, today);
    let milestones = milestones_reached(streak);
    if !milestones.is_empty() {
        store::rewards::grant_streak_milestones(&state.db, user_id, &milestones).await?;
    }

    Ok(())
}
