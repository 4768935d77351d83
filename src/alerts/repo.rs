use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{Alert, AlertInsert, AlertKind, AlertKindCount};

const ALERT_COLUMNS: &str = "id, kind, date, sugar_amount, caffeine_amount, created_at";

/// A concurrent insert for the same day can still hit the unique index
/// despite `ON CONFLICT`; that is the same outcome as an existing row.
fn insert_outcome(res: Result<Option<Alert>, sqlx::Error>) -> anyhow::Result<AlertInsert> {
    match res {
        Ok(Some(alert)) => Ok(AlertInsert::Created(alert)),
        Ok(None) => Ok(AlertInsert::AlreadyExists),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(AlertInsert::AlreadyExists),
        Err(e) => Err(e).context("insert alert"),
    }
}

impl Alert {
    /// Newest day first.
    pub async fn list_by_date_desc(db: &PgPool) -> anyhow::Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY date DESC"
        ))
        .fetch_all(db)
        .await
        .context("list alerts")?;
        Ok(rows)
    }

    pub async fn list_since(db: &PgPool, since: Date) -> anyhow::Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE date >= $1 ORDER BY date DESC"
        ))
        .bind(since)
        .fetch_all(db)
        .await
        .context("list alerts since")?;
        Ok(rows)
    }

    pub async fn list_by_kind(db: &PgPool, kind: AlertKind) -> anyhow::Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE kind = $1 ORDER BY date DESC"
        ))
        .bind(kind)
        .fetch_all(db)
        .await
        .context("list alerts by kind")?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Alert>> {
        let row = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find alert by id")?;
        Ok(row)
    }

    pub async fn find_by_date(db: &PgPool, date: Date) -> anyhow::Result<Option<Alert>> {
        let row = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE date = $1"
        ))
        .bind(date)
        .fetch_optional(db)
        .await
        .context("find alert by date")?;
        Ok(row)
    }

    /// Inserts unless the day already has an alert. A unique violation from a
    /// concurrent insert is reported as `AlreadyExists` too.
    pub async fn insert_if_absent(
        db: &PgPool,
        date: Date,
        kind: AlertKind,
        sugar_amount: f64,
        caffeine_amount: f64,
    ) -> anyhow::Result<AlertInsert> {
        let res = sqlx::query_as::<_, Alert>(&format!(
            r#"
            INSERT INTO alerts (kind, date, sugar_amount, caffeine_amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date) DO NOTHING
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(kind)
        .bind(date)
        .bind(sugar_amount)
        .bind(caffeine_amount)
        .fetch_optional(db)
        .await;

        insert_outcome(res)
    }

    pub async fn update_kind(db: &PgPool, id: Uuid, kind: AlertKind) -> anyhow::Result<Option<Alert>> {
        let row = sqlx::query_as::<_, Alert>(&format!(
            "UPDATE alerts SET kind = $2, updated_at = now() WHERE id = $1 RETURNING {ALERT_COLUMNS}"
        ))
        .bind(id)
        .bind(kind)
        .fetch_optional(db)
        .await
        .context("update alert kind")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM alerts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete alert")?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn delete_all(db: &PgPool) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM alerts")
            .execute(db)
            .await
            .context("delete all alerts")?;
        Ok(res.rows_affected())
    }

    pub async fn count_by_kind(db: &PgPool) -> anyhow::Result<Vec<AlertKindCount>> {
        let rows = sqlx::query_as::<_, AlertKindCount>(
            r#"
            SELECT kind, COUNT(*) AS count, MAX(created_at) AS latest
              FROM alerts
             GROUP BY kind
             ORDER BY count DESC
            "#,
        )
        .fetch_all(db)
        .await
        .context("count alerts by kind")?;
        Ok(rows)
    }
}
