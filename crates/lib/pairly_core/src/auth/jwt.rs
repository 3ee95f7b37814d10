//! JWT token generation and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};

/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Generate a signed JWT access token (HS256, 1 h expiry).
pub fn sign_access_token(user_id: Uuid, secret: &[u8]) -> Result<String, AuthError> {
    sign(user_id, TokenKind::Access, ACCESS_TOKEN_TTL_SECS, secret)
}

/// Generate a signed JWT refresh token (HS256, 7 d expiry).
pub fn sign_refresh_token(user_id: Uuid, secret: &[u8]) -> Result<String, AuthError> {
    sign(user_id, TokenKind::Refresh, REFRESH_TOKEN_TTL_SECS, secret)
}

fn sign(
    user_id: Uuid,
    kind: TokenKind,
    ttl_secs: i64,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        kind,
        jti: Uuid::new_v4().to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify a JWT, returning the claims on success.
///
/// Signature, expiry, and kind failures all map to the unauthorized class;
/// a token of the wrong kind is never accepted regardless of validity.
pub fn verify_token(
    token: &str,
    expected: TokenKind,
    secret: &[u8],
) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let claims = decode::<TokenClaims>(token, &key, &validation)
        .map_err(|_| AuthError::Unauthorized("invalid or expired token".into()))?
        .claims;
    if claims.kind != expected {
        return Err(AuthError::Unauthorized("wrong token class".into()));
    }
    Ok(claims)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    for var in ["JWT_SECRET", "AUTH_SECRET"] {
        if let Ok(secret) = std::env::var(var) {
            if !secret.is_empty() {
                return secret;
            }
        }
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pairly")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn access_token_round_trips() {
        let user = Uuid::new_v4();
        let token = sign_access_token(user, SECRET).expect("sign");
        let claims = verify_token(&token, TokenKind::Access, SECRET).expect("verify");
        assert_eq!(claims.sub, user.to_string());
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_token_is_rejected_on_access_path() {
        let token = sign_refresh_token(Uuid::new_v4(), SECRET).expect("sign");
        let err = verify_token(&token, TokenKind::Access, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn access_token_is_rejected_on_refresh_path() {
        let token = sign_access_token(Uuid::new_v4(), SECRET).expect("sign");
        let err = verify_token(&token, TokenKind::Refresh, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn back_to_back_issuances_are_distinct_tokens() {
        let user = Uuid::new_v4();
        let first = sign_refresh_token(user, SECRET).expect("sign");
        let second = sign_refresh_token(user, SECRET).expect("sign");
        // Both mints land in the same wall-clock second; the per-issuance
        // jti is what keeps the tokens from being byte-identical.
        assert_ne!(first, second);
    }

    #[test]
    fn forged_signature_is_rejected() {
        let token = sign_access_token(Uuid::new_v4(), SECRET).expect("sign");
        let err = verify_token(&token, TokenKind::Access, b"other-secret").unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Signed with a TTL well past the default validation leeway.
        let token = sign(Uuid::new_v4(), TokenKind::Access, -300, SECRET).expect("sign");
        let err = verify_token(&token, TokenKind::Access, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }
}
