//! # pairly_api
//!
//! HTTP API library for Pairly: identity sessions and real-time
//! notifications.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use pairly_core::auth::handoff::HandoffStore;
use pairly_core::auth::refresh::RefreshTokenStore;
use pairly_core::notify::registry::LiveRegistry;

use crate::config::ApiConfig;
use crate::handlers::{auth, notify};

/// Shared application state passed to all handlers.
///
/// The ephemeral stores and the live registry are owned here, by the
/// composition root, and injected into handlers through the router state.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Current refresh token per user (rotation = revocation).
    pub sessions: Arc<RefreshTokenStore>,
    /// Pending federation logins awaiting redemption.
    pub handoff: Arc<HandoffStore>,
    /// Currently connected notification recipients.
    pub registry: Arc<LiveRegistry>,
}

impl AppState {
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        Self {
            pool,
            config,
            sessions: Arc::new(RefreshTokenStore::new()),
            handoff: Arc::new(HandoffStore::new()),
            registry: Arc::new(LiveRegistry::new()),
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `pairly_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    pairly_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/google", get(auth::google_redirect_handler))
        .route("/auth/google/callback", get(auth::google_callback_handler))
        .route("/auth/google/verify", post(auth::google_verify_handler))
        .route("/auth/kakao", post(auth::kakao_login_handler));

    // Protected routes (require a bearer access token)
    let protected = Router::new()
        .route(
            "/notifications",
            get(notify::list_handler).delete(notify::delete_all_handler),
        )
        .route("/notifications/unread", get(notify::unread_handler))
        .route("/notifications/{id}", delete(notify::delete_one_handler))
        .route("/sse/subscribe", get(notify::subscribe_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
