//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types (which carry `#[serde(rename)]` for camelCase etc.).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_url: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Public-facing code handed out for couple linkage.
    pub pair_code: String,
    /// Federation provider name (`google`, `kakao`), `None` for local accounts.
    pub auth_provider: Option<String>,
    /// Stable provider-issued subject id, `None` for local accounts.
    pub subject: Option<String>,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: Option<String>,
}

/// Which class of token a JWT represents.
///
/// Access and refresh tokens share the signing mechanism but are never
/// interchangeable: verification checks the expected kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// Token class (`access` or `refresh`).
    pub kind: TokenKind,
    /// Unique id for this issuance (standard JWT `jti` claim).
    ///
    /// `iat`/`exp` are whole seconds, so without this two tokens minted for
    /// the same user within one second would be byte-identical — and literal
    /// comparison against the stored refresh record is the revocation
    /// mechanism, which needs every issuance to be distinct.
    pub jti: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// External identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Kakao,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Kakao => "kakao",
        }
    }
}

/// Normalized identity assertion returned by the federation adapter.
///
/// Only carries what the provider asserted; account linkage policy lives
/// in the session orchestrator.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub provider: Provider,
    /// Stable provider-issued subject identifier.
    pub subject: String,
    pub email: String,
    pub nickname: String,
    pub profile_url: Option<String>,
}
