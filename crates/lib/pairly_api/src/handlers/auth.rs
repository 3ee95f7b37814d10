//! Authentication request handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    KakaoLoginRequest, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
    SessionBundle, VerifyLoginCodeRequest,
};
use crate::services::auth;

/// `POST /auth/register` — create a new local account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let user = auth::register(&state, &body.email, &body.password).await?;
    Ok(Json(RegisterResponse { user }))
}

/// `POST /auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<SessionBundle>> {
    let bundle = auth::login(&state, &body.email, &body.password).await?;
    Ok(Json(bundle))
}

/// `GET /auth/google` — redirect the client to the Google consent screen.
pub async fn google_redirect_handler(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.config.google.authorize_url())
}

/// Query parameters for the OAuth callback.
#[derive(serde::Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
}

/// `GET /auth/google/callback` — exchange the authorization code and bounce
/// the resulting handoff code to the app via deep link.
///
/// The callback lands on a browser redirect the app does not control, so
/// tokens are never returned here; the deep link carries a short single-use
/// code the app redeems over `POST /auth/google/verify`.
pub async fn google_callback_handler(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> AppResult<Redirect> {
    let code = params
        .code
        .ok_or_else(|| AppError::Validation("Missing authorization code".into()))?;
    let security_code = auth::begin_google_login(&state, &code).await?;
    let target = format!("{}?securityCode={}", state.config.deeplink_url, security_code);
    Ok(Redirect::temporary(&target))
}

/// `POST /auth/google/verify` — redeem a handoff code for a session.
pub async fn google_verify_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyLoginCodeRequest>,
) -> AppResult<Json<SessionBundle>> {
    let bundle = auth::redeem_login_code(&state, &body.security_code).await?;
    Ok(Json(bundle))
}

/// `POST /auth/kakao` — log in with a Kakao bearer token.
pub async fn kakao_login_handler(
    State(state): State<AppState>,
    Json(body): Json<KakaoLoginRequest>,
) -> AppResult<Json<SessionBundle>> {
    let bundle = auth::kakao_login(&state, &body.access_token).await?;
    Ok(Json(bundle))
}

/// `POST /auth/refresh` — exchange a refresh token for a new token pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<SessionBundle>> {
    let bundle = auth::refresh(&state, &body.refresh_token).await?;
    Ok(Json(bundle))
}
