use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// Which threshold an alert records.
///
/// `Calories` comes from the first schema version and is never produced by
/// the alert policy; `Both` was added by migration 0002.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Sugar,
    Caffeine,
    Calories,
    Both,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::Sugar,
        AlertKind::Caffeine,
        AlertKind::Calories,
        AlertKind::Both,
    ];

    /// Kind for a sugar/caffeine breach, if any.
    pub fn for_breach(sugar: bool, caffeine: bool) -> Option<Self> {
        match (sugar, caffeine) {
            (true, true) => Some(AlertKind::Both),
            (true, false) => Some(AlertKind::Sugar),
            (false, true) => Some(AlertKind::Caffeine),
            (false, false) => None,
        }
    }
}

/// Alert record in the database. At most one per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub sugar_amount: f64,
    pub caffeine_amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outcome of an insert guarded by the unique date.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertInsert {
    Created(Alert),
    AlreadyExists,
}

#[derive(Debug, Clone, FromRow)]
pub struct AlertKindCount {
    pub kind: AlertKind,
    pub count: i64,
    pub latest: OffsetDateTime,
}
