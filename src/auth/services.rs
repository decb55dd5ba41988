use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{Role, User};
use crate::error::AppError;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Create an account and hand back a signed token. Hashing happens here and
/// in `update_password` only, never implicitly on save.
pub async fn register(state: &AppState, mut payload: RegisterRequest) -> Result<AuthResponse, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::validation("email", "not a valid email address"));
    }
    let username_len = payload.username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username_len) {
        return Err(AppError::validation(
            "username",
            "must be between 3 and 100 characters",
        ));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::validation(
            "password",
            "must be at least 6 characters",
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::DuplicateUsername);
    }

    let hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or(Role::User);
    let user = User::create(&state.db, &payload.username, &payload.email, &hash, role).await?;

    let token = JwtKeys::from_ref(state).sign(user.id, user.role)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn login(state: &AppState, mut payload: LoginRequest) -> Result<AuthResponse, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    let now = OffsetDateTime::now_utc();

    // Fail fast while locked out, before any credential-store access.
    if let Some(secs) = state.throttle.remaining_lockout(&payload.email, now) {
        warn!(email = %payload.email, "login attempt while locked out");
        return Err(AppError::TooManyAttempts {
            retry_after_secs: secs,
        });
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        state.throttle.record_failure(&payload.email, now);
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthenticated("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        state.throttle.record_failure(&payload.email, now);
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthenticated("Invalid credentials".into()));
    }

    state.throttle.clear(&payload.email);
    let token = JwtKeys::from_ref(state).sign(user.id, user.role)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Re-hash with a fresh salt and persist.
pub async fn update_password(
    state: &AppState,
    user_id: i64,
    new_plaintext: &str,
) -> Result<(), AppError> {
    if new_plaintext.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "password",
            "must be at least 6 characters",
        ));
    }
    let hash = hash_password(new_plaintext)?;
    User::update_password(&state.db, user_id, &hash).await?;
    info!(user_id = %user_id, "password updated");
    Ok(())
}

/// Create the configured admin account if its email is not registered yet.
pub async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let Some(admin) = &state.config.admin else {
        return Ok(());
    };
    let email = admin.email.trim().to_lowercase();
    if User::find_by_email(&state.db, &email).await?.is_none() {
        let hash = hash_password(&admin.password)?;
        let user = User::create(&state.db, &admin.username, &email, &hash, Role::Admin).await?;
        info!(user_id = %user.id, "seeded admin user");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
    }
}
