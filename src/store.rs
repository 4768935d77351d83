//! Read/write seam between the tracking core and PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::alerts::repo_types::{Alert, AlertInsert, AlertKind};
use crate::auth::repo_types::{Role, User};
use crate::consumptions::repo_types::{Consumption, Contribution};

#[derive(Error, Debug)]
#[error("record store: {0:#}")]
pub struct StoreError(#[from] anyhow::Error);

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `[start, end)`, newest first.
    async fn find_consumptions_in_range(
        &self,
        owner_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Consumption>, StoreError>;

    /// Oldest first, with contributor identity populated.
    async fn find_all_consumptions_for_user(&self, user_id: Uuid) -> Result<Vec<Contribution>, StoreError>;

    /// Newest day first.
    async fn find_alerts_sorted(&self) -> Result<Vec<Alert>, StoreError>;

    async fn insert_alert_if_absent(
        &self,
        date: Date,
        kind: AlertKind,
        sugar_amount: f64,
        caffeine_amount: f64,
    ) -> Result<AlertInsert, StoreError>;

    async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_consumptions_in_range(
        &self,
        owner_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Consumption>, StoreError> {
        Ok(Consumption::list_in_range(&self.db, owner_id, start, end).await?)
    }

    async fn find_all_consumptions_for_user(&self, user_id: Uuid) -> Result<Vec<Contribution>, StoreError> {
        Ok(Consumption::list_contributions(&self.db, user_id).await?)
    }

    async fn find_alerts_sorted(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(Alert::list_by_date_desc(&self.db).await?)
    }

    async fn insert_alert_if_absent(
        &self,
        date: Date,
        kind: AlertKind,
        sugar_amount: f64,
        caffeine_amount: f64,
    ) -> Result<AlertInsert, StoreError> {
        Ok(Alert::insert_if_absent(&self.db, date, kind, sugar_amount, caffeine_amount).await?)
    }

    async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_role(&self.db, role).await?)
    }
}

/// In-process store used by unit tests.
#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        pub users: Mutex<Vec<User>>,
        pub consumptions: Mutex<Vec<Consumption>>,
        pub contributions: Mutex<Vec<(Uuid, Contribution)>>,
        pub alerts: Mutex<Vec<Alert>>,
    }

    impl MemoryStore {
        pub fn with_user(user: User) -> Self {
            let store = Self::default();
            store.users.lock().unwrap().push(user);
            store
        }

        pub fn alert_count(&self) -> usize {
            self.alerts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn find_consumptions_in_range(
            &self,
            owner_id: Uuid,
            start: OffsetDateTime,
            end: OffsetDateTime,
        ) -> Result<Vec<Consumption>, StoreError> {
            let mut rows: Vec<Consumption> = self
                .consumptions
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.user_id == owner_id && c.created_at >= start && c.created_at < end)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn find_all_consumptions_for_user(&self, user_id: Uuid) -> Result<Vec<Contribution>, StoreError> {
            let mut rows: Vec<Contribution> = self
                .contributions
                .lock()
                .unwrap()
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, c)| c.clone())
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(rows)
        }

        async fn find_alerts_sorted(&self) -> Result<Vec<Alert>, StoreError> {
            let mut rows = self.alerts.lock().unwrap().clone();
            rows.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(rows)
        }

        async fn insert_alert_if_absent(
            &self,
            date: Date,
            kind: AlertKind,
            sugar_amount: f64,
            caffeine_amount: f64,
        ) -> Result<AlertInsert, StoreError> {
            let mut alerts = self.alerts.lock().unwrap();
            if alerts.iter().any(|a| a.date == date) {
                return Ok(AlertInsert::AlreadyExists);
            }
            let alert = Alert {
                id: Uuid::new_v4(),
                kind,
                date,
                sugar_amount,
                caffeine_amount,
                created_at: OffsetDateTime::now_utc(),
            };
            alerts.push(alert.clone());
            Ok(AlertInsert::Created(alert))
        }

        async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.role == role).cloned())
        }
    }
}
