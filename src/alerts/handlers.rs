use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    AlertStatsResponse, ConsecutiveResponse, CreateAlertRequest, CreateAlertResponse,
    DeletedResponse, HistoryQuery, KindStats, TodayAlertResponse, UpdateAlertRequest,
};
use super::policy::consecutive_alert_days;
use super::repo_types::{Alert, AlertInsert, AlertKind};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts/stats", get(alert_stats))
        .route("/alerts/today", get(today_alert))
        .route("/alerts/consecutive", get(consecutive_days))
        .route("/alerts/history", get(history))
        .route("/alerts/type/:kind", get(list_by_kind))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts).post(create_alert).delete(delete_all))
        .route(
            "/alerts/:id",
            get(get_alert).put(update_alert).delete(delete_alert),
        )
}

#[instrument(skip(state))]
pub async fn list_alerts(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Alert>>, AppError> {
    Ok(Json(Alert::list_by_date_desc(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_alert(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, AppError> {
    Alert::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("alert"))
}

#[instrument(skip(state))]
pub async fn list_by_kind(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(kind): Path<AlertKind>,
) -> Result<Json<Vec<Alert>>, AppError> {
    Ok(Json(Alert::list_by_kind(&state.db, kind).await?))
}

/// Manual insert, same one-per-day rule as the automatic check.
#[instrument(skip(state, body))]
pub async fn create_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<CreateAlertResponse>), AppError> {
    let date = body.date.unwrap_or_else(|| state.today());
    let inserted = state
        .store
        .insert_alert_if_absent(date, body.kind, body.sugar_amount, body.caffeine_amount)
        .await?;

    Ok(match inserted {
        AlertInsert::Created(alert) => {
            info!(user_id = %auth.id, %date, kind = ?body.kind, "alert created manually");
            (
                StatusCode::CREATED,
                Json(CreateAlertResponse {
                    created: true,
                    alert: Some(alert),
                }),
            )
        }
        AlertInsert::AlreadyExists => {
            let existing = Alert::find_by_date(&state.db, date).await?;
            (
                StatusCode::OK,
                Json(CreateAlertResponse {
                    created: false,
                    alert: existing,
                }),
            )
        }
    })
}

#[instrument(skip(state, body))]
pub async fn update_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAlertRequest>,
) -> Result<Json<Alert>, AppError> {
    auth.require_admin()?;
    Alert::update_kind(&state.db, id, body.kind)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("alert"))
}

#[instrument(skip(state))]
pub async fn delete_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;
    if !Alert::delete(&state.db, id).await? {
        return Err(AppError::NotFound("alert"));
    }
    info!(admin_id = %auth.id, alert_id = %id, "alert deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DeletedResponse>, AppError> {
    auth.require_admin()?;
    let deleted = Alert::delete_all(&state.db).await?;
    info!(admin_id = %auth.id, deleted, "all alerts deleted");
    Ok(Json(DeletedResponse { deleted }))
}

#[instrument(skip(state))]
pub async fn today_alert(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<TodayAlertResponse>, AppError> {
    let alert = Alert::find_by_date(&state.db, state.today()).await?;
    Ok(Json(TodayAlertResponse {
        has_alert: alert.is_some(),
        alert,
    }))
}

#[instrument(skip(state))]
pub async fn consecutive_days(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ConsecutiveResponse>, AppError> {
    let alerts = state.store.find_alerts_sorted().await?;
    let streak = consecutive_alert_days(&alerts, state.today());
    let alerts = alerts
        .into_iter()
        .take(streak.consecutive_days as usize)
        .collect();
    Ok(Json(ConsecutiveResponse { streak, alerts }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let since = q.since(state.today());
    Ok(Json(Alert::list_since(&state.db, since).await?))
}

#[instrument(skip(state))]
pub async fn alert_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<AlertStatsResponse>, AppError> {
    let by_type: Vec<KindStats> = Alert::count_by_kind(&state.db)
        .await?
        .into_iter()
        .map(|r| KindStats {
            kind: r.kind,
            count: r.count,
            latest: r.latest,
        })
        .collect();
    let total_alerts = by_type.iter().map(|k| k.count).sum();
    Ok(Json(AlertStatsResponse {
        total_alerts,
        by_type,
    }))
}
