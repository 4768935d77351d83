use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateConsumptionRequest, Pagination, PeriodQuery, PeriodRecap, TodaySummary,
    UpdateConsumptionRequest,
};
use super::repo_types::Consumption;
use super::services::{period_recap, refresh_alert, today_summary, validate_changes, validate_new};
use crate::aggregation::{totals, window::Period, window::Window, UserStats};
use crate::alerts::policy::{check_and_record, AlertCheck};
use crate::auth::{
    extractors::AuthUser,
    repo_types::{Role, User},
};
use crate::{error::AppError, state::AppState};

pub fn crud_routes() -> Router<AppState> {
    Router::new()
        .route("/consumptions", get(list_consumptions).post(create_consumption))
        .route(
            "/consumptions/:id",
            get(get_consumption)
                .put(update_consumption)
                .delete(delete_consumption),
        )
        .route("/consumptions/user/:user_id", get(list_for_user))
        .route("/consumptions/user/:user_id/stats", get(user_stats))
}

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/consumptions/amed/today", get(amed_today))
        .route("/consumptions/amed/period", get(amed_period))
        .route("/consumptions/amed/check-alert", post(check_alert))
}

async fn tracked_user(state: &AppState) -> Result<User, AppError> {
    state
        .store
        .find_user_by_role(Role::Amed)
        .await?
        .ok_or(AppError::NotFound("tracked user"))
}

/// Only the contributor who logged an entry, or an admin, may change it.
fn ensure_can_edit(auth: &AuthUser, consumption: &Consumption) -> Result<(), AppError> {
    if auth.role == Role::Admin || consumption.added_by == auth.id {
        return Ok(());
    }
    warn!(user_id = %auth.id, consumption_id = %consumption.id, "edit denied");
    Err(AppError::Forbidden)
}

#[instrument(skip(state))]
pub async fn list_consumptions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Consumption>>, AppError> {
    let limit = page.limit.clamp(1, 500);
    let offset = page.offset.max(0);
    Ok(Json(Consumption::list(&state.db, limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_consumption(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Consumption>, AppError> {
    Consumption::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("consumption"))
}

#[instrument(skip(state, body))]
pub async fn create_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateConsumptionRequest>,
) -> Result<(StatusCode, Json<Consumption>), AppError> {
    let owner = match body.user_id {
        Some(id) => User::find_by_id(&state.db, id)
            .await?
            .ok_or(AppError::NotFound("user"))?
            .id,
        None => tracked_user(&state).await?.id,
    };

    let new = validate_new(body, owner, auth.id)?;
    let consumption = Consumption::create(&state.db, new).await?;
    info!(
        consumption_id = %consumption.id,
        owner_id = %owner,
        added_by = %auth.id,
        product = %consumption.product,
        "consumption logged"
    );

    refresh_alert(&state).await;
    Ok((StatusCode::CREATED, Json(consumption)))
}

#[instrument(skip(state, body))]
pub async fn update_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateConsumptionRequest>,
) -> Result<Json<Consumption>, AppError> {
    let existing = Consumption::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("consumption"))?;
    ensure_can_edit(&auth, &existing)?;

    let changes = validate_changes(body)?;
    let updated = Consumption::update(&state.db, id, changes)
        .await?
        .ok_or(AppError::NotFound("consumption"))?;
    info!(consumption_id = %id, user_id = %auth.id, "consumption updated");

    refresh_alert(&state).await;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = Consumption::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("consumption"))?;
    ensure_can_edit(&auth, &existing)?;

    if !Consumption::delete(&state.db, id).await? {
        return Err(AppError::NotFound("consumption"));
    }
    info!(consumption_id = %id, user_id = %auth.id, "consumption deleted");

    refresh_alert(&state).await;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Consumption>>, AppError> {
    Ok(Json(Consumption::list_by_user(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStats>, AppError> {
    let records = Consumption::list_by_user(&state.db, user_id).await?;
    Ok(Json(UserStats::from(totals(&records))))
}

#[instrument(skip(state))]
pub async fn amed_today(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<TodaySummary>, AppError> {
    let amed = tracked_user(&state).await?;
    let now = state.now();
    let offset = state.config.report_offset;
    let window = Window::today(now, offset);

    let records = state
        .store
        .find_consumptions_in_range(amed.id, window.start, window.fetch_end())
        .await?;
    Ok(Json(today_summary(records, now, offset)))
}

#[instrument(skip(state))]
pub async fn amed_period(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<PeriodRecap>, AppError> {
    let amed = tracked_user(&state).await?;
    let now = state.now();
    let offset = state.config.report_offset;
    let period = Period::new(q.period, q.days);
    let window = period.window(now, offset);

    let records = state
        .store
        .find_consumptions_in_range(amed.id, window.start, window.fetch_end())
        .await?;
    Ok(Json(period_recap(
        &records,
        period,
        &state.config.limits,
        now,
        offset,
    )))
}

#[instrument(skip(state))]
pub async fn check_alert(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<AlertCheck>, AppError> {
    let check = check_and_record(
        state.store.as_ref(),
        &state.config.limits,
        state.now(),
        state.config.report_offset,
    )
    .await?;
    Ok(Json(check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::window::{PeriodKind, MAX_LOOKBACK_DAYS};
    use crate::auth::services::test_user;
    use crate::consumptions::repo_types::QuantityUnit;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn consumption(added_by: Uuid) -> Consumption {
        let at = OffsetDateTime::now_utc();
        Consumption {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            added_by,
            product: "Cola".into(),
            product_image: None,
            quantity: 330.0,
            unit: QuantityUnit::Milliliters,
            location: "Office".into(),
            caffeine: 32.0,
            sugar: 35.0,
            calories: 139.0,
            notes: String::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn only_contributor_or_admin_can_edit() {
        let author = AuthUser { id: Uuid::new_v4(), role: Role::User };
        let other = AuthUser { id: Uuid::new_v4(), role: Role::Amed };
        let admin = AuthUser { id: Uuid::new_v4(), role: Role::Admin };
        let c = consumption(author.id);

        assert!(ensure_can_edit(&author, &c).is_ok());
        assert!(ensure_can_edit(&admin, &c).is_ok());
        assert!(matches!(ensure_can_edit(&other, &c), Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn today_summary_uses_tracked_user() {
        let amed = test_user(Role::Amed);
        let mut drink = consumption(Uuid::new_v4());
        drink.user_id = amed.id;
        let store = MemoryStore::with_user(amed);
        store.consumptions.lock().unwrap().push(drink);

        let mut state = AppState::fake();
        state.store = Arc::new(store);
        let auth = AuthUser { id: Uuid::new_v4(), role: Role::User };

        let Json(summary) = amed_today(State(state), auth).await.unwrap();
        assert_eq!(summary.consumptions_count, 1);
        assert_eq!(summary.contributors_count, 1);
        assert_eq!(summary.totals.sugar, 35.0);
    }

    #[tokio::test]
    async fn oversized_last_days_period_is_capped() {
        let amed = test_user(Role::Amed);
        let mut drink = consumption(Uuid::new_v4());
        drink.user_id = amed.id;
        let store = MemoryStore::with_user(amed);
        store.consumptions.lock().unwrap().push(drink);

        let mut state = AppState::fake();
        state.store = Arc::new(store);
        let auth = AuthUser { id: Uuid::new_v4(), role: Role::User };
        let query = PeriodQuery {
            period: PeriodKind::LastDays,
            days: Some(u32::MAX),
        };

        let Json(recap) = amed_period(State(state), auth, Query(query)).await.unwrap();
        assert_eq!(recap.days, MAX_LOOKBACK_DAYS);
        assert_eq!(recap.totals.count, 1);
    }

    #[tokio::test]
    async fn check_alert_without_tracked_user_is_not_found() {
        let auth = AuthUser { id: Uuid::new_v4(), role: Role::User };
        let err = check_alert(State(AppState::fake()), auth).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("tracked user")));
    }
}
