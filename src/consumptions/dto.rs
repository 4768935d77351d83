use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::nutrition::Per100g;
use super::repo_types::{Consumption, QuantityUnit};
use crate::aggregation::{limits::HealthLimits, limits::LimitAssessment, window::PeriodKind, Totals};

/// A quantity is either a number (with `unit`) or a serving text like "330 ml".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Amount(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumptionRequest {
    pub product: Option<String>,
    pub product_image: Option<String>,
    pub quantity: Option<QuantityInput>,
    pub unit: Option<QuantityUnit>,
    pub location: Option<String>,
    /// Owner of the log; defaults to the tracked user.
    pub user_id: Option<Uuid>,
    pub caffeine: Option<f64>,
    pub sugar: Option<f64>,
    pub calories: Option<f64>,
    /// When given, missing nutrient amounts are computed from it.
    pub per_100g: Option<Per100g>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsumptionRequest {
    pub product: Option<String>,
    pub product_image: Option<String>,
    pub quantity: Option<QuantityInput>,
    pub unit: Option<QuantityUnit>,
    pub location: Option<String>,
    pub caffeine: Option<f64>,
    pub sugar: Option<f64>,
    pub calories: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: PeriodKind,
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub totals: Totals,
    pub contributors_count: usize,
    pub consumptions_count: usize,
    pub consumptions: Vec<Consumption>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecap {
    pub days: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
    pub totals: Totals,
    pub limits: HealthLimits,
    pub status: LimitAssessment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_accepts_number_or_text() {
        let req: CreateConsumptionRequest =
            serde_json::from_str(r#"{"product":"Cola","quantity":330,"unit":"ml","location":"Home"}"#)
                .unwrap();
        assert!(matches!(req.quantity, Some(QuantityInput::Amount(q)) if q == 330.0));
        assert_eq!(req.unit, Some(QuantityUnit::Milliliters));

        let req: CreateConsumptionRequest =
            serde_json::from_str(r#"{"product":"Cola","quantity":"33 cl or 330 ml"}"#).unwrap();
        assert!(matches!(req.quantity, Some(QuantityInput::Text(_))));
    }

    #[test]
    fn rejects_unknown_unit_and_period() {
        assert!(serde_json::from_str::<CreateConsumptionRequest>(r#"{"unit":"oz"}"#).is_err());
        assert!(serde_json::from_str::<PeriodQuery>(r#"{"period":"year"}"#).is_err());
        let q: PeriodQuery = serde_json::from_str(r#"{"period":"last_days","days":3}"#).unwrap();
        assert_eq!(q.period, PeriodKind::LastDays);
    }
}
