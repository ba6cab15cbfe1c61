use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Lifetime of the session token issued by register/login/social login.
pub const AUTH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Lifetime of a single-purpose password reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Auth,
    Reset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    pub kind: TokenKind,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt_secret)
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Auth => AUTH_TOKEN_TTL,
            TokenKind::Reset => RESET_TOKEN_TTL,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_auth(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Auth)
    }
    pub fn sign_reset(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Reset)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    /// Verify a session token, rejecting reset tokens presented as bearer auth.
    pub fn verify_auth(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Auth {
            anyhow::bail!("not an auth token");
        }
        Ok(claims)
    }

    /// Verify a reset token, rejecting session tokens smuggled into the reset flow.
    pub fn verify_reset(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Reset {
            anyhow::bail!("not a reset token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::new("test-secret")
    }

    #[test]
    fn sign_and_verify_auth_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_auth(user_id, "user@example.com").expect("sign auth");
        let claims = keys.verify_auth(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.kind, TokenKind::Auth);
    }

    #[test]
    fn auth_token_lives_seven_days() {
        let keys = make_keys();
        let token = keys
            .sign_auth(Uuid::new_v4(), "user@example.com")
            .expect("sign auth");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn reset_token_lives_one_hour() {
        let keys = make_keys();
        let token = keys
            .sign_reset(Uuid::new_v4(), "user@example.com")
            .expect("sign reset");
        let claims = keys.verify_reset(&token).expect("verify reset");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn verify_auth_rejects_reset_token() {
        let keys = make_keys();
        let token = keys
            .sign_reset(Uuid::new_v4(), "user@example.com")
            .expect("sign reset");
        let err = keys.verify_auth(&token).unwrap_err();
        assert!(err.to_string().contains("not an auth token"));
    }

    #[test]
    fn verify_reset_rejects_auth_token() {
        let keys = make_keys();
        let token = keys
            .sign_auth(Uuid::new_v4(), "user@example.com")
            .expect("sign auth");
        let err = keys.verify_reset(&token).unwrap_err();
        assert!(err.to_string().contains("not a reset token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys();
        // Backdate well past the default 60s validation leeway.
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "user@example.com".into(),
            iat: (past - TimeDuration::hours(1)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
            kind: TokenKind::Auth,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify_auth(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let keys = make_keys();
        assert!(keys.verify("not-a-jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtKeys::new("other-secret")
            .sign_auth(Uuid::new_v4(), "user@example.com")
            .expect("sign auth");
        assert!(make_keys().verify_auth(&token).is_err());
    }
}
