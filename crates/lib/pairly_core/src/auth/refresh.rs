//! Current-refresh-token store.
//!
//! Holds the single live refresh token per user. Every session issuance
//! overwrites the stored value (rotation), which is also the revocation
//! mechanism: a structurally valid token that no longer matches the stored
//! value is rejected. There is no separate blacklist.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use super::jwt::REFRESH_TOKEN_TTL_SECS;

/// The currently valid refresh token for one user.
struct RefreshRecord {
    token: String,
    expires_at: Instant,
}

/// In-memory store mapping user id to their current refresh token.
pub struct RefreshTokenStore {
    records: DashMap<Uuid, RefreshRecord>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Store `token` as the user's current refresh token, replacing any
    /// previous one. Racing writers resolve last-write-wins.
    pub fn put(&self, user_id: Uuid, token: String) {
        self.records.insert(
            user_id,
            RefreshRecord {
                token,
                expires_at: Instant::now() + Duration::from_secs(REFRESH_TOKEN_TTL_SECS as u64),
            },
        );
    }

    /// Whether `token` is the literal current refresh token for the user.
    ///
    /// False when no record exists, the record expired, or the value differs
    /// (i.e. the token was superseded by a later issuance).
    pub fn matches(&self, user_id: Uuid, token: &str) -> bool {
        match self.records.get(&user_id) {
            Some(record) => record.expires_at > Instant::now() && record.token == token,
            None => false,
        }
    }

    /// Drop the user's current refresh token, ending the session.
    pub fn revoke(&self, user_id: Uuid) {
        self.records.remove(&user_id);
    }

    /// Evict expired records.
    pub fn cleanup(&self) {
        self.records.retain(|_, v| v.expires_at > Instant::now());
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(600));
            loop {
                interval.tick().await;
                store.cleanup();
            }
        })
    }
}

impl Default for RefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_token_matches_until_rotated() {
        let store = RefreshTokenStore::new();
        let user = Uuid::new_v4();

        store.put(user, "first".into());
        assert!(store.matches(user, "first"));

        // Rotation replaces the record; the previous token is now rejected.
        store.put(user, "second".into());
        assert!(!store.matches(user, "first"));
        assert!(store.matches(user, "second"));
    }

    #[test]
    fn unknown_user_never_matches() {
        let store = RefreshTokenStore::new();
        assert!(!store.matches(Uuid::new_v4(), "anything"));
    }

    #[test]
    fn revoked_token_no_longer_matches() {
        let store = RefreshTokenStore::new();
        let user = Uuid::new_v4();

        store.put(user, "tok".into());
        store.revoke(user);
        assert!(!store.matches(user, "tok"));
    }

    #[test]
    fn expired_record_no_longer_matches() {
        let store = RefreshTokenStore::new();
        let user = Uuid::new_v4();

        store.records.insert(
            user,
            RefreshRecord {
                token: "tok".into(),
                expires_at: Instant::now() - Duration::from_secs(1),
            },
        );
        assert!(!store.matches(user, "tok"));
    }

    #[test]
    fn cleanup_drops_expired_records() {
        let store = RefreshTokenStore::new();
        let live = Uuid::new_v4();
        let dead = Uuid::new_v4();

        store.put(live, "live".into());
        store.records.insert(
            dead,
            RefreshRecord {
                token: "dead".into(),
                expires_at: Instant::now() - Duration::from_secs(1),
            },
        );

        store.cleanup();
        assert!(store.matches(live, "live"));
        assert!(!store.records.contains_key(&dead));
    }
}
