use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::blacklist::TokenBlacklist;
use crate::auth::claims::Claims;
use crate::auth::repo_types::Role;
use crate::config::JwtConfig;
use crate::state::AppState;

/// Why a presented token was rejected. Token states only move one way:
/// valid tokens expire with time or get revoked on logout, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Token has been revoked")]
    Revoked,
    #[error("Invalid token")]
    Invalid,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn sign(&self, user_id: i64, role: Role) -> anyhow::Result<String> {
        self.sign_with_ttl(user_id, role, self.ttl)
    }

    pub fn sign_with_ttl(&self, user_id: i64, role: Role, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Signature, issuer and audience are checked by jsonwebtoken; expiry is
    /// compared manually so a zero-TTL token is expired the moment it is
    /// minted. Revocation is checked after the signature, before expiry.
    pub fn verify(&self, token: &str, blacklist: &TokenBlacklist) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = false;

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| TokenError::Invalid)?;

        if blacklist.contains(token) {
            return Err(TokenError::Revoked);
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if data.claims.exp as i64 <= now {
            return Err(TokenError::Expired);
        }

        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let blacklist = TokenBlacklist::new();
        let token = keys.sign(42, Role::User).expect("sign");
        let claims = keys.verify(&token, &blacklist).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn admin_role_survives_roundtrip() {
        let keys = make_keys();
        let blacklist = TokenBlacklist::new();
        let token = keys.sign(1, Role::Admin).expect("sign");
        let claims = keys.verify(&token, &blacklist).expect("verify");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn zero_ttl_token_is_immediately_expired() {
        let keys = make_keys();
        let blacklist = TokenBlacklist::new();
        let token = keys
            .sign_with_ttl(42, Role::User, Duration::ZERO)
            .expect("sign");
        let err = keys.verify(&token, &blacklist).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let keys = make_keys();
        let other = JwtKeys::from_config(&crate::config::JwtConfig {
            secret: "different".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        });
        let blacklist = TokenBlacklist::new();
        let token = keys.sign(42, Role::User).expect("sign");
        let err = other.verify(&token, &blacklist).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        let keys = make_keys();
        let blacklist = TokenBlacklist::new();
        let err = keys.verify("not.a.jwt", &blacklist).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[tokio::test]
    async fn revoked_token_fails_while_others_stay_valid() {
        let keys = make_keys();
        let blacklist = TokenBlacklist::new();
        let first = keys.sign(42, Role::User).expect("sign");
        // distinct ttl so the two tokens cannot be byte-identical
        let second = keys
            .sign_with_ttl(42, Role::User, Duration::minutes(10))
            .expect("sign");

        blacklist.revoke(&first);
        blacklist.revoke(&first); // idempotent

        assert_eq!(
            keys.verify(&first, &blacklist).unwrap_err(),
            TokenError::Revoked
        );
        assert!(keys.verify(&second, &blacklist).is_ok());
    }
}
