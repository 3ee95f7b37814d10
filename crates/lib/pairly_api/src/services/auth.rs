//! Session orchestrator — ties credential verification and federation
//! exchange to token issuance and refresh rotation.

use tracing::info;
use uuid::Uuid;

use pairly_core::auth::{jwt, password, queries};
use pairly_core::models::auth::{FederatedIdentity, TokenKind, User};
use pairly_core::{couple, federation, notify};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CoupleView, PartnerView, SessionBundle, UserView};

// ---------------------------------------------------------------------------
// Local accounts
// ---------------------------------------------------------------------------

/// Register a new local account. The raw secret is never stored; the new
/// identity gets a fresh public pair code.
pub async fn register(state: &AppState, email: &str, secret: &str) -> AppResult<UserView> {
    if secret.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if queries::email_exists(&state.pool, email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = password::hash_password(secret)?;
    let nickname = email.split('@').next().unwrap_or(email);
    let pair_code = Uuid::new_v4().to_string();

    let user = queries::create_local(
        &state.pool,
        email,
        &password_hash,
        nickname,
        &pair_code,
        &state.config.default_profile_url,
    )
    .await?;

    info!(user_id = %user.id, "registered local account");
    Ok(UserView::from_user(&user, None))
}

/// Authenticate a local account and issue a session.
pub async fn login(state: &AppState, email: &str, secret: &str) -> AppResult<SessionBundle> {
    let found = queries::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("No such user".into()))?;

    let password_hash = found
        .password_hash
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !password::verify_password(secret, &password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    issue_session(state, &found.user).await
}

// ---------------------------------------------------------------------------
// Federation
// ---------------------------------------------------------------------------

/// Complete a Google authorization-code exchange and park the normalized
/// identity under a single-use handoff code for the deep-link client.
pub async fn begin_google_login(state: &AppState, code: &str) -> AppResult<String> {
    let identity = state.config.google.exchange_code(code).await?;
    let security_code = state.handoff.issue(identity);
    Ok(security_code)
}

/// Redeem a handoff code for a session. Unknown, expired, and
/// already-consumed codes are indistinguishable to the caller.
pub async fn redeem_login_code(state: &AppState, security_code: &str) -> AppResult<SessionBundle> {
    let identity = state
        .handoff
        .take(security_code)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired login code".into()))?;

    let user = find_or_create_federated(state, identity).await?;
    issue_session(state, &user).await
}

/// Log in with a Kakao bearer token.
pub async fn kakao_login(state: &AppState, access_token: &str) -> AppResult<SessionBundle> {
    let identity = federation::fetch_kakao_identity(access_token).await?;
    let user = find_or_create_federated(state, identity).await?;
    issue_session(state, &user).await
}

/// Resolve a federated identity to its account, creating one on first login.
async fn find_or_create_federated(
    state: &AppState,
    identity: FederatedIdentity,
) -> AppResult<User> {
    if let Some(user) = queries::find_by_subject(&state.pool, &identity.subject).await? {
        return Ok(user);
    }

    let pair_code = Uuid::new_v4().to_string();
    let profile_url = identity
        .profile_url
        .clone()
        .unwrap_or_else(|| state.config.default_profile_url.clone());
    let user = queries::create_federated(&state.pool, &identity, &pair_code, &profile_url).await?;
    info!(user_id = %user.id, provider = identity.provider.as_str(), "created federated account");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Issue a fresh token pair and assemble the login response.
///
/// Overwrites the user's stored refresh token on every call, so each new
/// login invalidates any previously issued refresh token for that user.
pub async fn issue_session(state: &AppState, user: &User) -> AppResult<SessionBundle> {
    let secret = state.config.jwt_secret.as_bytes();
    let access_token = jwt::sign_access_token(user.id, secret)?;
    let refresh_token = jwt::sign_refresh_token(user.id, secret)?;

    let couple = couple::find_for(&state.pool, user.id).await?;
    let partner = match &couple {
        Some(c) => {
            couple::find_partner_profile(&state.pool, couple::partner_id(c, user.id)).await?
        }
        None => None,
    };
    let has_unread = notify::queries::has_unread(&state.pool, user.id).await?;

    state.sessions.put(user.id, refresh_token.clone());

    Ok(SessionBundle {
        access_token,
        refresh_token,
        user: UserView::from_user(user, couple.as_ref().map(|c| c.id)),
        partner: partner.map(|p| PartnerView {
            id: p.id,
            nickname: p.nickname,
            profile_url: p.profile_url,
            birthday: p.birthday,
        }),
        couple: couple.map(|c| CoupleView {
            anniversary: c.anniversary,
        }),
        has_unread_notifications: has_unread,
    })
}

/// Exchange a refresh token for a new session (rotation on every use).
///
/// A structurally valid token that no longer matches the stored record is
/// rejected; rotation is the sole revocation mechanism.
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<SessionBundle> {
    let secret = state.config.jwt_secret.as_bytes();
    let claims = jwt::verify_token(refresh_token, TokenKind::Refresh, secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".into()))?;

    if !state.sessions.matches(user_id, refresh_token) {
        return Err(AppError::Unauthorized(
            "Refresh token superseded or revoked".into(),
        ));
    }

    let user = queries::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    issue_session(state, &user).await
}
