//! Daily threshold alerts.
//!
//! A day moves from "no alert" to "alert recorded" at most once: the check
//! runs after every consumption write and the unique date on `alerts` turns
//! repeated or concurrent inserts into no-ops.

use serde::Serialize;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use super::repo_types::{Alert, AlertInsert, AlertKind};
use crate::aggregation::{
    limits::HealthLimits,
    streak::{streak_ending, Streak},
    totals_for_window,
    window::{local_date, Window},
    Totals,
};
use crate::auth::repo_types::Role;
use crate::error::AppError;
use crate::store::RecordStore;

/// Calories are tracked but never raise an alert.
pub fn evaluate(totals: &Totals, limits: &HealthLimits) -> Option<AlertKind> {
    let assessment = limits.assess(totals);
    AlertKind::for_breach(assessment.sugar_exceeded, assessment.caffeine_exceeded)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCheck {
    pub totals: Totals,
    pub triggered: Option<AlertKind>,
    /// True only when this check inserted the day's alert.
    pub created: bool,
    pub alert: Option<Alert>,
}

pub async fn check_and_record(
    store: &dyn RecordStore,
    limits: &HealthLimits,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<AlertCheck, AppError> {
    let tracked = store
        .find_user_by_role(Role::Amed)
        .await?
        .ok_or(AppError::NotFound("tracked user"))?;

    let window = Window::today(now, offset);
    let records = store
        .find_consumptions_in_range(tracked.id, window.start, window.fetch_end())
        .await?;
    let totals = totals_for_window(&records, &window);

    let Some(kind) = evaluate(&totals, limits) else {
        debug!(sugar = totals.sugar, caffeine = totals.caffeine, "below daily limits");
        return Ok(AlertCheck {
            totals,
            triggered: None,
            created: false,
            alert: None,
        });
    };

    let today = local_date(now, offset);
    let (created, alert) = match store
        .insert_alert_if_absent(today, kind, totals.sugar, totals.caffeine)
        .await?
    {
        AlertInsert::Created(alert) => {
            info!(date = %today, kind = ?kind, "daily alert recorded");
            (true, Some(alert))
        }
        AlertInsert::AlreadyExists => {
            debug!(date = %today, "alert already recorded today");
            (false, None)
        }
    };

    Ok(AlertCheck {
        totals,
        triggered: Some(kind),
        created,
        alert,
    })
}

/// Streak of alert days ending today. Alerts may come in any order.
pub fn consecutive_alert_days(alerts: &[Alert], today: Date) -> Streak {
    streak_ending(alerts.iter().map(|a| a.date), today)
}
