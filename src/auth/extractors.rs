use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::Role;
use crate::error::AppError;
use crate::state::AppState;

/// Identity resolved from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

/// The raw bearer token as presented; logout needs it to revoke.
pub struct BearerToken(pub String);

fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization header".into()))?;

    Ok(token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(parts)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token, &state.blacklist).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::Unauthenticated(e.to_string())
        })?;
        Ok(CurrentUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Admin-only routes.
pub struct RequireAdmin(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        match user.role {
            Role::Admin => Ok(RequireAdmin(user)),
            Role::User => Err(AppError::Forbidden),
        }
    }
}

/// Routes reserved for regular accounts; the two roles have disjoint
/// route sets.
pub struct RequireUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        match user.role {
            Role::User => Ok(RequireUser(user)),
            Role::Admin => Err(AppError::Forbidden),
        }
    }
}
