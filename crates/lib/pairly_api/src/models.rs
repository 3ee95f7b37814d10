//! Request/response types for the HTTP surface.
//!
//! Wire field names are camelCase, matching what the mobile client sends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pairly_core::models::auth::User;
use pairly_core::models::notify::{Notification, NotificationKind};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Auth requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLoginCodeRequest {
    pub security_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KakaoLoginRequest {
    pub access_token: String,
}

// ---------------------------------------------------------------------------
// Auth responses
// ---------------------------------------------------------------------------

/// Profile view of the authenticated user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_url: Option<String>,
    /// Public code used for couple linkage.
    pub code: String,
    pub couple_id: Option<Uuid>,
    pub birthday: Option<NaiveDate>,
}

impl UserView {
    pub fn from_user(user: &User, couple_id: Option<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            profile_url: user.profile_url.clone(),
            code: user.pair_code.clone(),
            couple_id,
            birthday: user.birthday,
        }
    }
}

/// Profile view of the user's partner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerView {
    pub id: Uuid,
    pub nickname: String,
    pub profile_url: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Relationship summary included in the session bundle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleView {
    pub anniversary: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: UserView,
}

/// Everything a client needs after a successful login or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
    pub partner: Option<PartnerView>,
    pub couple: Option<CoupleView>,
    pub has_unread_notifications: bool,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Notification as returned to its recipient (the owner id is implicit).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            payload: n.payload,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadResponse {
    pub has_unread: bool,
}
