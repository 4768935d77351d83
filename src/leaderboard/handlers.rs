use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, instrument};

use super::ranker::{rank, RankedContributor};
use crate::auth::{extractors::AuthUser, repo_types::Role};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/consumptions/leaderboard", get(leaderboard))
}

#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<RankedContributor>>, AppError> {
    let amed = state
        .store
        .find_user_by_role(Role::Amed)
        .await?
        .ok_or(AppError::NotFound("tracked user"))?;

    let contributions = state.store.find_all_consumptions_for_user(amed.id).await?;
    let ranked = rank(&contributions, state.now(), state.config.report_offset);
    debug!(contributors = ranked.len(), "leaderboard computed");
    Ok(Json(ranked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::test_user;
    use crate::consumptions::repo_types::Contribution;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn caller() -> AuthUser {
        AuthUser { id: Uuid::new_v4(), role: Role::User }
    }

    #[tokio::test]
    async fn missing_tracked_user_is_not_found() {
        let err = leaderboard(State(AppState::fake()), caller()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("tracked user")));
    }

    #[tokio::test]
    async fn ranks_contributions_to_tracked_user_only() {
        let amed = test_user(Role::Amed);
        let amed_id = amed.id;
        let store = MemoryStore::with_user(amed);
        let helper = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        {
            let mut rows = store.contributions.lock().unwrap();
            for owner in [amed_id, amed_id, Uuid::new_v4()] {
                rows.push((
                    owner,
                    Contribution {
                        contributor_id: helper,
                        contributor_username: "helper".into(),
                        created_at: now,
                    },
                ));
            }
        }

        let mut state = AppState::fake();
        state.store = Arc::new(store);
        let Json(ranked) = leaderboard(State(state), caller()).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_contributions, 2);
        assert!(ranked[0].badges.is_top_monthly);
    }

    #[tokio::test]
    async fn empty_log_gives_empty_board() {
        let mut state = AppState::fake();
        state.store = Arc::new(MemoryStore::with_user(test_user(Role::Amed)));
        let Json(ranked) = leaderboard(State(state), caller()).await.unwrap();
        assert!(ranked.is_empty());
    }
}
