use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::{Alert, AlertKind};
use crate::aggregation::{streak::Streak, window::days_before};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Defaults to today.
    #[serde(default, with = "calendar_date::option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub sugar_amount: f64,
    #[serde(default)]
    pub caffeine_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertRequest {
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

#[derive(Debug, Serialize)]
pub struct CreateAlertResponse {
    pub created: bool,
    pub alert: Option<Alert>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayAlertResponse {
    pub has_alert: bool,
    pub alert: Option<Alert>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsecutiveResponse {
    #[serde(flatten)]
    pub streak: Streak,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_days")]
    pub days: u32,
}
fn default_history_days() -> u32 {
    30
}

impl HistoryQuery {
    /// First day of the requested history, ending `today`.
    pub fn since(&self, today: Date) -> Date {
        days_before(today, self.days)
    }
}

#[derive(Debug, Serialize)]
pub struct KindStats {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub count: i64,
    #[serde(rename = "latestAlert", with = "time::serde::rfc3339")]
    pub latest: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatsResponse {
    pub total_alerts: i64,
    pub by_type: Vec<KindStats>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn create_request_accepts_optional_date() {
        let req: CreateAlertRequest = serde_json::from_str(r#"{"type":"caffeine"}"#).unwrap();
        assert_eq!(req.kind, AlertKind::Caffeine);
        assert_eq!(req.date, None);

        let req: CreateAlertRequest =
            serde_json::from_str(r#"{"type":"both","date":"2024-03-05","sugarAmount":55}"#).unwrap();
        assert_eq!(req.date, Some(date!(2024-03-05)));
        assert_eq!(req.sugar_amount, 55.0);
    }

    #[test]
    fn create_request_rejects_unknown_type() {
        assert!(serde_json::from_str::<CreateAlertRequest>(r#"{"type":"salt"}"#).is_err());
    }

    #[test]
    fn consecutive_response_is_flat() {
        let resp = ConsecutiveResponse {
            streak: Streak { consecutive_days: 2, current_streak: true },
            alerts: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["consecutiveDays"], 2);
        assert_eq!(json["currentStreak"], true);
    }

    #[test]
    fn history_start_is_capped() {
        let q = HistoryQuery { days: 30 };
        assert_eq!(q.since(date!(2024-03-05)), date!(2024-02-04));

        let q = HistoryQuery { days: u32::MAX };
        assert_eq!(q.since(date!(2024-03-05)), date!(2014-02-26));
    }
}
