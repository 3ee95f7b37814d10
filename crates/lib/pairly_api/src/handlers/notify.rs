//! Notification request handlers, including the long-lived SSE stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use pairly_core::models::notify::NotificationEvent;
use pairly_core::notify::registry::LiveRegistry;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{NotificationListResponse, NotificationView, UnreadResponse};
use crate::services::notify;

fn recipient_id(user: &AuthenticatedUser) -> AppResult<Uuid> {
    Uuid::parse_str(&user.0.sub).map_err(|_| AppError::Unauthorized("Invalid token subject".into()))
}

/// `GET /notifications` — list the caller's notifications; the unread ones
/// are marked read in the same operation.
pub async fn list_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<NotificationListResponse>> {
    let recipient = recipient_id(&user)?;
    let items = notify::list_and_mark_read(&state, recipient).await?;
    Ok(Json(NotificationListResponse {
        notifications: items.into_iter().map(NotificationView::from).collect(),
    }))
}

/// `GET /notifications/unread` — unread-badge probe.
pub async fn unread_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<UnreadResponse>> {
    let recipient = recipient_id(&user)?;
    let has_unread = notify::has_unread(&state, recipient).await?;
    Ok(Json(UnreadResponse { has_unread }))
}

/// `DELETE /notifications/{id}` — delete one owned notification.
pub async fn delete_one_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let recipient = recipient_id(&user)?;
    notify::delete_one(&state, recipient, notification_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// `DELETE /notifications` — delete all of the caller's notifications.
pub async fn delete_all_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<serde_json::Value>> {
    let recipient = recipient_id(&user)?;
    let removed = notify::delete_all(&state, recipient).await?;
    Ok(Json(serde_json::json!({"success": true, "removed": removed})))
}

/// `GET /sse/subscribe` — open the caller's live event stream.
///
/// Subscribing replaces any previous connection for the same user. The
/// registry entry is removed when the stream is dropped, unless a newer
/// connection already took its place.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Sse<KeepAliveStream<EventStream>>> {
    let recipient = recipient_id(&user)?;
    let subscription = state.registry.subscribe(recipient);

    let stream = EventStream {
        inner: ReceiverStream::new(subscription.receiver),
        _guard: SubscriptionGuard {
            registry: state.registry.clone(),
            recipient,
            serial: subscription.serial,
        },
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// SSE stream over the registry's event receiver.
///
/// Holds the unsubscribe guard so transport closure cleans up the registry.
pub struct EventStream {
    inner: ReceiverStream<NotificationEvent>,
    _guard: SubscriptionGuard,
}

impl Stream for EventStream {
    type Item = Result<Event, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Event::default().json_data(&event))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Serial-checked unsubscribe on drop: a late drop from a replaced
/// connection leaves the newer registration untouched.
struct SubscriptionGuard {
    registry: Arc<LiveRegistry>,
    recipient: Uuid,
    serial: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.recipient, self.serial);
    }
}
