use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::aggregation::Intake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quantity_unit")]
pub enum QuantityUnit {
    #[sqlx(rename = "g")]
    #[serde(rename = "g")]
    Grams,
    #[sqlx(rename = "ml")]
    #[serde(rename = "ml")]
    Milliliters,
}

/// Consumption record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub id: Uuid,
    pub user_id: Uuid,  // owner: whose intake this is
    pub added_by: Uuid, // contributor who logged it
    pub product: String,
    pub product_image: Option<String>,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub location: String,
    pub caffeine: f64,
    pub sugar: f64,
    pub calories: f64,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Intake for Consumption {
    fn taken_at(&self) -> OffsetDateTime {
        self.created_at
    }
    fn sugar(&self) -> f64 {
        self.sugar
    }
    fn caffeine(&self) -> f64 {
        self.caffeine
    }
    fn calories(&self) -> f64 {
        self.calories
    }
}

/// One entry of the tracked user's log joined with whoever added it.
#[derive(Debug, Clone, FromRow)]
pub struct Contribution {
    pub contributor_id: Uuid,
    pub contributor_username: String,
    pub created_at: OffsetDateTime,
}

/// Validated insert.
#[derive(Debug, Clone)]
pub struct NewConsumption {
    pub user_id: Uuid,
    pub added_by: Uuid,
    pub product: String,
    pub product_image: Option<String>,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub location: String,
    pub caffeine: f64,
    pub sugar: f64,
    pub calories: f64,
    pub notes: String,
    pub created_at: Option<OffsetDateTime>,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ConsumptionChanges {
    pub product: Option<String>,
    pub product_image: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<QuantityUnit>,
    pub location: Option<String>,
    pub caffeine: Option<f64>,
    pub sugar: Option<f64>,
    pub calories: Option<f64>,
    pub notes: Option<String>,
}
