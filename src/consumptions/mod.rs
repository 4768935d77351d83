mod dto;
pub mod handlers;
pub mod nutrition;
mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::tracking_routes())
        .merge(handlers::crud_routes())
}
