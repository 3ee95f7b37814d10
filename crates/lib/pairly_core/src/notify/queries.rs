//! Notification log database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::NotifyError;
use crate::models::notify::{Notification, NotificationKind};
use crate::uuid::uuidv7;

/// Persist a notification row, returning the stored record.
pub async fn insert(
    pool: &PgPool,
    recipient: Uuid,
    kind: NotificationKind,
    payload: &serde_json::Value,
) -> Result<Notification, NotifyError> {
    let id = uuidv7();
    let raw = serde_json::to_string(payload)
        .map_err(|e| NotifyError::Internal(format!("payload encode: {e}")))?;
    let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
        "INSERT INTO notifications (id, user_id, kind, payload) \
         VALUES ($1, $2, $3, $4) RETURNING created_at",
    )
    .bind(id)
    .bind(recipient)
    .bind(kind.as_str())
    .bind(&raw)
    .fetch_one(pool)
    .await?;
    Ok(Notification {
        id,
        user_id: recipient,
        kind,
        payload: payload.clone(),
        is_read: false,
        created_at,
    })
}

/// Fetch all notifications for a recipient, oldest first.
pub async fn list_for(pool: &PgPool, recipient: Uuid) -> Result<Vec<Notification>, NotifyError> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, bool, DateTime<Utc>)>(
        "SELECT id, kind, payload, is_read, created_at FROM notifications \
         WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(recipient)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, kind, payload, is_read, created_at)| {
            let kind = NotificationKind::parse(&kind)
                .ok_or_else(|| NotifyError::Internal(format!("unknown notification kind: {kind}")))?;
            // Rows written before payloads were JSON-encoded fall back to a string.
            let payload = match serde_json::from_str(&payload) {
                Ok(value) => value,
                Err(_) => serde_json::Value::String(payload),
            };
            Ok(Notification {
                id,
                user_id: recipient,
                kind,
                payload,
                is_read,
                created_at,
            })
        })
        .collect()
}

/// Mark the given notifications read. Scoped to the recipient so a caller
/// can never flip another user's rows.
pub async fn mark_read(pool: &PgPool, recipient: Uuid, ids: &[Uuid]) -> Result<u64, NotifyError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true \
         WHERE user_id = $1 AND is_read = false AND id = ANY($2)",
    )
    .bind(recipient)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Delete one notification. A row that exists but belongs to another
/// recipient is reported as not found, never as forbidden.
pub async fn delete_one(pool: &PgPool, recipient: Uuid, id: Uuid) -> Result<(), NotifyError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(recipient)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(NotifyError::NotFound);
    }
    Ok(())
}

/// Delete all of a recipient's notifications, returning the count removed.
pub async fn delete_all(pool: &PgPool, recipient: Uuid) -> Result<u64, NotifyError> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(recipient)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Whether the recipient has any unread notifications.
pub async fn has_unread(pool: &PgPool, recipient: Uuid) -> Result<bool, NotifyError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE user_id = $1 AND is_read = false)",
    )
    .bind(recipient)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Retention sweep: drop read notifications older than `days`.
pub async fn purge_read_older_than(pool: &PgPool, days: i32) -> Result<u64, NotifyError> {
    let result = sqlx::query(
        "DELETE FROM notifications \
         WHERE is_read = true AND created_at < now() - make_interval(days => $1)",
    )
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
