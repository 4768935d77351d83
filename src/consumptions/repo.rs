use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Consumption, ConsumptionChanges, Contribution, NewConsumption};

const CONSUMPTION_COLUMNS: &str = "id, user_id, added_by, product, product_image, quantity, unit, \
     location, caffeine, sugar, calories, notes, created_at, updated_at";

impl Consumption {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            SELECT {CONSUMPTION_COLUMNS}
              FROM consumptions
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list consumptions")?;
        Ok(rows)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            SELECT {CONSUMPTION_COLUMNS}
              FROM consumptions
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list consumptions by user")?;
        Ok(rows)
    }

    /// Half-open range `[start, end)`, newest first.
    pub async fn list_in_range(
        db: &PgPool,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            SELECT {CONSUMPTION_COLUMNS}
              FROM consumptions
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await
        .context("list consumptions in range")?;
        Ok(rows)
    }

    /// Every entry of `user_id`'s log with its contributor, oldest first.
    pub async fn list_contributions(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Contribution>> {
        let rows = sqlx::query_as::<_, Contribution>(
            r#"
            SELECT c.added_by AS contributor_id,
                   u.username AS contributor_username,
                   c.created_at
              FROM consumptions c
              JOIN users u ON u.id = c.added_by
             WHERE c.user_id = $1
             ORDER BY c.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list contributions")?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Consumption>> {
        let row = sqlx::query_as::<_, Consumption>(&format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM consumptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find consumption by id")?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, new: NewConsumption) -> anyhow::Result<Consumption> {
        let row = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            INSERT INTO consumptions
                (user_id, added_by, product, product_image, quantity, unit, location,
                 caffeine, sugar, calories, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, now()))
            RETURNING {CONSUMPTION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.added_by)
        .bind(new.product)
        .bind(new.product_image)
        .bind(new.quantity)
        .bind(new.unit)
        .bind(new.location)
        .bind(new.caffeine)
        .bind(new.sugar)
        .bind(new.calories)
        .bind(new.notes)
        .bind(new.created_at)
        .fetch_one(db)
        .await
        .context("insert consumption")?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: ConsumptionChanges,
    ) -> anyhow::Result<Option<Consumption>> {
        let row = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            UPDATE consumptions
               SET product = COALESCE($2, product),
                   product_image = COALESCE($3, product_image),
                   quantity = COALESCE($4, quantity),
                   unit = COALESCE($5, unit),
                   location = COALESCE($6, location),
                   caffeine = COALESCE($7, caffeine),
                   sugar = COALESCE($8, sugar),
                   calories = COALESCE($9, calories),
                   notes = COALESCE($10, notes),
                   updated_at = now()
             WHERE id = $1
            RETURNING {CONSUMPTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.product)
        .bind(changes.product_image)
        .bind(changes.quantity)
        .bind(changes.unit)
        .bind(changes.location)
        .bind(changes.caffeine)
        .bind(changes.sugar)
        .bind(changes.calories)
        .bind(changes.notes)
        .fetch_optional(db)
        .await
        .context("update consumption")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM consumptions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete consumption")?;
        Ok(res.rows_affected() > 0)
    }
}
