use std::collections::HashSet;

use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, warn};
use uuid::Uuid;

use super::dto::{
    CreateConsumptionRequest, PeriodRecap, QuantityInput, TodaySummary, UpdateConsumptionRequest,
};
use super::nutrition::{parse_quantity, scale};
use super::repo_types::{Consumption, ConsumptionChanges, NewConsumption, QuantityUnit};
use crate::aggregation::{limits::HealthLimits, totals_for_window, window::Period, window::Window};
use crate::alerts::policy::check_and_record;
use crate::error::{AppError, ValidationError};
use crate::state::AppState;

const RECENT_IN_SUMMARY: usize = 10;

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn non_negative(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::NegativeNutrient(field)),
        other => Ok(other),
    }
}

fn resolve_quantity(
    input: QuantityInput,
    unit: Option<QuantityUnit>,
) -> Result<(f64, QuantityUnit), ValidationError> {
    let (amount, unit) = match input {
        QuantityInput::Amount(v) => (v, unit.unwrap_or(QuantityUnit::Milliliters)),
        QuantityInput::Text(text) => {
            let (v, parsed) = parse_quantity(&text)?;
            (v, unit.unwrap_or(parsed))
        }
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::NonPositiveQuantity);
    }
    Ok((amount, unit))
}

/// Checks a create request. Missing nutrients are taken from `per100g` when
/// given, otherwise they are zero.
pub fn validate_new(
    req: CreateConsumptionRequest,
    owner: Uuid,
    added_by: Uuid,
) -> Result<NewConsumption, ValidationError> {
    let product = required(req.product, "product")?;
    let location = required(req.location, "location")?;
    let quantity = req.quantity.ok_or(ValidationError::MissingField("quantity"))?;
    let (quantity, unit) = resolve_quantity(quantity, req.unit)?;

    let per_100g = req.per_100g.unwrap_or_default();
    let caffeine = non_negative(req.caffeine, "caffeine")?.unwrap_or_else(|| scale(per_100g.caffeine, quantity));
    let sugar = non_negative(req.sugar, "sugar")?.unwrap_or_else(|| scale(per_100g.sugar, quantity));
    let calories = non_negative(req.calories, "calories")?.unwrap_or_else(|| scale(per_100g.calories, quantity));

    Ok(NewConsumption {
        user_id: owner,
        added_by,
        product,
        product_image: req.product_image.filter(|s| !s.trim().is_empty()),
        quantity,
        unit,
        location,
        caffeine,
        sugar,
        calories,
        notes: req.notes.map(|n| n.trim().to_string()).unwrap_or_default(),
        created_at: req.created_at,
    })
}

pub fn validate_changes(req: UpdateConsumptionRequest) -> Result<ConsumptionChanges, ValidationError> {
    let (quantity, unit) = match req.quantity {
        Some(q) => {
            let (v, u) = resolve_quantity(q, req.unit)?;
            (Some(v), Some(u))
        }
        None => (None, req.unit),
    };
    let product = match req.product {
        Some(p) => Some(required(Some(p), "product")?),
        None => None,
    };
    let location = match req.location {
        Some(l) => Some(required(Some(l), "location")?),
        None => None,
    };

    Ok(ConsumptionChanges {
        product,
        product_image: req.product_image,
        quantity,
        unit,
        location,
        caffeine: non_negative(req.caffeine, "caffeine")?,
        sugar: non_negative(req.sugar, "sugar")?,
        calories: non_negative(req.calories, "calories")?,
        notes: req.notes.map(|n| n.trim().to_string()),
    })
}

/// `records` are the tracked user's consumptions, newest first.
pub fn today_summary(records: Vec<Consumption>, now: OffsetDateTime, offset: UtcOffset) -> TodaySummary {
    let window = Window::today(now, offset);
    let mut today: Vec<Consumption> = records
        .into_iter()
        .filter(|c| window.contains(c.created_at))
        .collect();
    today.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let totals = totals_for_window(&today, &window);
    let contributors: HashSet<Uuid> = today.iter().map(|c| c.added_by).collect();
    let consumptions_count = today.len();
    today.truncate(RECENT_IN_SUMMARY);

    TodaySummary {
        totals,
        contributors_count: contributors.len(),
        consumptions_count,
        consumptions: today,
    }
}

pub fn period_recap(
    records: &[Consumption],
    period: Period,
    daily: &HealthLimits,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> PeriodRecap {
    let window = period.window(now, offset);
    let days = period.days(now, offset);
    let limits = daily.scaled(days);
    let totals = totals_for_window(records, &window);
    PeriodRecap {
        days,
        from: window.start,
        to: window.end,
        totals,
        limits,
        status: limits.assess(&totals),
    }
}

/// Re-evaluates today's alert after a write. The write has already
/// succeeded, so failures are only logged.
pub async fn refresh_alert(state: &AppState) {
    let now = state.now();
    match check_and_record(state.store.as_ref(), &state.config.limits, now, state.config.report_offset).await {
        Ok(check) => debug!(triggered = ?check.triggered, created = check.created, "alert check done"),
        Err(AppError::NotFound(what)) => debug!(what, "alert check skipped"),
        Err(e) => warn!(error = %e, "alert check failed"),
    }
}
