//! Authentication and session logic.
//!
//! Provides password hashing, JWT management, the ephemeral handoff-code
//! and refresh-token stores, and the credential-store database queries
//! shared by the API crate.

pub mod handoff;
pub mod jwt;
pub mod password;
pub mod queries;
pub mod refresh;

use thiserror::Error;

/// Authentication errors.
///
/// One variant per externally observable failure class; callers map these
/// onto HTTP statuses without string matching.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identifier is already registered.
    #[error("email already registered")]
    Conflict,

    /// No account matches the identifier.
    #[error("no such user")]
    NotFound,

    /// Bad credential, stale or forged token, or a consumed handoff code.
    #[error("{0}")]
    Unauthorized(String),

    /// The federation provider call failed or returned an unusable assertion.
    #[error("federation provider failure: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
