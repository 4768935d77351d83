use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateUserRequest, UpdateUserRequest};
use crate::auth::{
    dto::PublicUser,
    extractors::AuthUser,
    repo::UserChanges,
    repo_types::User,
    services::{hash_password, is_valid_email, MIN_PASSWORD_LEN},
};
use crate::error::{AppError, ValidationError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/deactivate", put(deactivate_user))
}

/// Normalizes and checks the fields of an update.
fn validate_changes(req: UpdateUserRequest) -> Result<UserChanges, ValidationError> {
    let email = match req.email.map(|e| e.trim().to_lowercase()) {
        Some(e) if !is_valid_email(&e) => return Err(ValidationError::InvalidEmail),
        other => other,
    };
    let username = match req.username.map(|u| u.trim().to_string()) {
        Some(u) if u.is_empty() => return Err(ValidationError::MissingField("username")),
        other => other,
    };
    Ok(UserChanges {
        email,
        username,
        role: req.role,
    })
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    auth.require_admin()?;
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    auth.require_admin()?;
    User::find_by_id(&state.db, id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or(AppError::NotFound("user"))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    auth.require_admin()?;
    let email = body.email.trim().to_lowercase();
    let username = body.username.trim().to_string();

    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail.into());
    }
    if username.is_empty() {
        return Err(ValidationError::MissingField("username").into());
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort.into());
    }
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }
    if User::find_by_username(&state.db, &username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(AppError::Conflict("Username already taken"));
    }

    let hash = hash_password(&body.password)?;
    let user = User::create(&state.db, &email, &username, &hash, body.role).await?;
    info!(admin_id = %auth.id, user_id = %user.id, role = ?user.role, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    auth.require_admin()?;
    let changes = validate_changes(body)?;

    if let Some(email) = &changes.email {
        if matches!(User::find_by_email(&state.db, email).await?, Some(u) if u.id != id) {
            return Err(AppError::Conflict("Email already registered"));
        }
    }
    if let Some(username) = &changes.username {
        if matches!(User::find_by_username(&state.db, username).await?, Some(u) if u.id != id) {
            return Err(AppError::Conflict("Username already taken"));
        }
    }

    let user = User::update(&state.db, id, changes)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    info!(admin_id = %auth.id, user_id = %id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    auth.require_admin()?;
    let user = User::deactivate(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    // Deactivation also kills outstanding refresh tokens.
    User::revoke_tokens(&state.db, id).await?;
    info!(admin_id = %auth.id, user_id = %id, "user deactivated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;
    if auth.id == id {
        return Err(AppError::Conflict("Cannot delete your own account"));
    }
    if !User::delete(&state.db, id).await? {
        return Err(AppError::NotFound("user"));
    }
    info!(admin_id = %auth.id, user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
