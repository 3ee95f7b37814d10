//! Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of notification the app emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A partner completed a shared bucket-list item.
    ItemDone,
    /// The couple link was established.
    CoupleLinked,
    /// An anniversary is coming up.
    Anniversary,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ItemDone => "ITEM_DONE",
            NotificationKind::CoupleLinked => "COUPLE_LINKED",
            NotificationKind::Anniversary => "ANNIVERSARY",
        }
    }

    /// Parse the storage representation back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ITEM_DONE" => Some(NotificationKind::ItemDone),
            "COUPLE_LINKED" => Some(NotificationKind::CoupleLinked),
            "ANNIVERSARY" => Some(NotificationKind::Anniversary),
            _ => None,
        }
    }
}

/// Persisted notification row.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Frame pushed over a live connection.
///
/// Serializes to the wire shape clients expect: `{"type": …, "payload": …}`.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_form() {
        for kind in [
            NotificationKind::ItemDone,
            NotificationKind::CoupleLinked,
            NotificationKind::Anniversary,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("NOPE"), None);
    }

    #[test]
    fn event_serializes_with_type_field() {
        let event = NotificationEvent {
            kind: NotificationKind::ItemDone,
            payload: serde_json::json!({"title": "done"}),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "ITEM_DONE");
        assert_eq!(json["payload"]["title"], "done");
    }
}
