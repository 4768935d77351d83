use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        repo_types::{Role, User},
        services::{
            hash_password, is_valid_email, refresh_still_valid, verify_password, JwtKeys,
            MIN_PASSWORD_LEN,
        },
    },
    error::{AppError, ValidationError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/revoke/:id", post(revoke_refresh_tokens))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(&user).map_err(|e| {
        error!(error = %e, user_id = %user.id, "jwt sign failed");
        AppError::Internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ValidationError::InvalidEmail.into());
    }
    if payload.username.is_empty() {
        return Err(ValidationError::MissingField("username").into());
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ValidationError::PasswordTooShort.into());
    }
    // Admins are created by other admins only.
    let role = match payload.role.unwrap_or_default() {
        Role::Admin => return Err(AppError::Forbidden),
        r => r,
    };

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }
    if User::find_by_username(&state.db, &payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict("Username already taken"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &payload.username, &hash, role).await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ValidationError::InvalidEmail.into());
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login on deactivated account");
        return Err(AppError::Unauthorized("Account deactivated"));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue(&state, user)?))
}

/// Rotates the token pair.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token")
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AppError::Unauthorized("Invalid refresh token"))?;

    if !refresh_still_valid(&claims, &user) {
        warn!(user_id = %user.id, "refresh token revoked");
        return Err(AppError::Unauthorized("Refresh token expired"));
    }

    Ok(Json(issue(&state, user)?))
}

/// Tokens are stateless; the client drops them. Revocation goes through
/// `/auth/revoke/:id`.
#[instrument]
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out",
    })
}

#[instrument(skip(state))]
pub async fn revoke_refresh_tokens(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    auth.require_admin()?;
    if !User::revoke_tokens(&state.db, id).await? {
        return Err(AppError::NotFound("user"));
    }
    info!(admin_id = %auth.id, user_id = %id, "refresh tokens revoked");
    Ok(Json(MessageResponse {
        message: "All refresh tokens revoked",
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, auth.id).await?.ok_or_else(|| {
        error!(user_id = %auth.id, "user not found");
        AppError::NotFound("user")
    })?;

    Ok(Json(user.into()))
}
