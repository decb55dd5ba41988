use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::auth::extractors::{BearerToken, CurrentUser};
use crate::auth::repo_types::User;
use crate::auth::services;
use crate::error::{AppError, OkResponse};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/password", post(change_password))
        .route("/auth/me", get(me))
}

#[derive(Debug, serde::Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = services::login(&state, payload).await?;
    Ok(Json(response))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    BearerToken(token): BearerToken,
) -> Result<Json<OkResponse>, AppError> {
    state.blacklist.revoke(&token);
    info!(user_id = %user.id, "user logged out");
    Ok(Json(OkResponse { success: true }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, AppError> {
    services::update_password(&state, user.id, &payload.password).await?;
    Ok(Json(OkResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<PublicUser>, AppError> {
    let record = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User no longer exists".into()))?;
    Ok(Json(record.into()))
}
