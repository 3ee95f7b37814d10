//! API server configuration.

use pairly_core::auth::jwt::resolve_jwt_secret;
use pairly_core::federation::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleOAuth};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Registered Google OAuth client.
    pub google: GoogleOAuth,
    /// Deep link the federation callback redirects to, carrying the
    /// handoff code out-of-band to the real client.
    pub deeplink_url: String,
    /// Profile image assigned to accounts that arrive without one.
    pub default_profile_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                     | Default                               |
    /// |------------------------------|---------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3000`                      |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/pairly`    |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file         |
    /// | `GOOGLE_CLIENT_ID` etc.      | empty (federation disabled in dev)    |
    /// | `DEEPLINK_URL`               | `pairly://login`                      |
    /// | `DEFAULT_PROFILE_URL`        | empty                                 |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/pairly".into()),
            jwt_secret: resolve_jwt_secret(),
            google: GoogleOAuth {
                client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: std::env::var("GOOGLE_REDIRECT_URI").unwrap_or_default(),
                state: std::env::var("GOOGLE_SECURE_STATE").unwrap_or_default(),
                auth_url: GOOGLE_AUTH_URL.into(),
                token_url: GOOGLE_TOKEN_URL.into(),
            },
            deeplink_url: std::env::var("DEEPLINK_URL").unwrap_or_else(|_| "pairly://login".into()),
            default_profile_url: std::env::var("DEFAULT_PROFILE_URL").unwrap_or_default(),
        }
    }
}
