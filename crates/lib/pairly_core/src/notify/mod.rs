//! Notification persistence and live delivery.
//!
//! Every notification is written to the database before any delivery
//! attempt; the live SSE push is best-effort on top of that durable record.

pub mod queries;
pub mod registry;

use thiserror::Error;

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No notification with that id belongs to the caller.
    #[error("notification not found")]
    NotFound,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
