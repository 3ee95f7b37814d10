//! Notification dispatcher — durable record first, live push best-effort.

use tracing::debug;
use uuid::Uuid;

use pairly_core::models::notify::{Notification, NotificationEvent, NotificationKind};
use pairly_core::notify::queries;

use crate::AppState;
use crate::error::AppResult;

/// Record a notification and push it to the recipient's live connection
/// if one exists.
///
/// Persistence failure propagates; a failed or absent live delivery does
/// not — the row stays retrievable on the next list call either way.
pub async fn dispatch(
    state: &AppState,
    recipient: Uuid,
    kind: NotificationKind,
    payload: serde_json::Value,
) -> AppResult<Notification> {
    let saved = queries::insert(&state.pool, recipient, kind, &payload).await?;

    let delivered = state.registry.push(
        recipient,
        NotificationEvent {
            kind: saved.kind,
            payload: saved.payload.clone(),
        },
    );
    if !delivered {
        debug!(%recipient, kind = kind.as_str(), "no live connection, left for next poll");
    }

    Ok(saved)
}

/// Return all of the recipient's notifications and mark the unread ones
/// read.
///
/// The select and the update are two statements; a crash between them
/// re-reads the same rows as unread on the next call (at-least-once), but
/// a re-read can never produce duplicates.
pub async fn list_and_mark_read(
    state: &AppState,
    recipient: Uuid,
) -> AppResult<Vec<Notification>> {
    let items = queries::list_for(&state.pool, recipient).await?;

    let unread: Vec<Uuid> = items
        .iter()
        .filter(|n| !n.is_read)
        .map(|n| n.id)
        .collect();
    if !unread.is_empty() {
        queries::mark_read(&state.pool, recipient, &unread).await?;
    }

    Ok(items)
}

/// Delete one notification owned by the recipient.
pub async fn delete_one(state: &AppState, recipient: Uuid, id: Uuid) -> AppResult<()> {
    queries::delete_one(&state.pool, recipient, id).await?;
    Ok(())
}

/// Delete all of the recipient's notifications.
pub async fn delete_all(state: &AppState, recipient: Uuid) -> AppResult<u64> {
    let removed = queries::delete_all(&state.pool, recipient).await?;
    Ok(removed)
}

/// Cheap unread-badge probe.
pub async fn has_unread(state: &AppState, recipient: Uuid) -> AppResult<bool> {
    let unread = queries::has_unread(&state.pool, recipient).await?;
    Ok(unread)
}
