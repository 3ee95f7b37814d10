//! Single-use handoff codes for federation logins.
//!
//! The provider callback lands on a redirect channel the real client does
//! not control, so the completed identity exchange is parked here under a
//! short opaque code and relayed out-of-band (deep link). The code is
//! consumed exactly once; an expired code behaves identically to a code
//! that was never issued.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::auth::FederatedIdentity;

/// TTL for pending login entries (5 minutes).
const HANDOFF_TTL: Duration = Duration::from_secs(300);

/// A completed federation exchange awaiting redemption.
struct PendingLogin {
    identity: FederatedIdentity,
    created_at: Instant,
}

/// In-memory store for pending federation logins (keyed by handoff code).
pub struct HandoffStore {
    pending: DashMap<String, PendingLogin>,
}

impl HandoffStore {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Park an identity under a fresh single-use code and return the code.
    pub fn issue(&self, identity: FederatedIdentity) -> String {
        let code = Uuid::new_v4().to_string();
        self.pending.insert(
            code.clone(),
            PendingLogin {
                identity,
                created_at: Instant::now(),
            },
        );
        code
    }

    /// Take (remove and return) a pending login.
    ///
    /// Removal happens before the TTL check, so two concurrent redemptions
    /// of the same code cannot both succeed. Returns `None` for unknown and
    /// expired codes alike.
    pub fn take(&self, code: &str) -> Option<FederatedIdentity> {
        let (_, pending) = self.pending.remove(code)?;
        if pending.created_at.elapsed() > HANDOFF_TTL {
            return None;
        }
        Some(pending.identity)
    }

    /// Evict expired entries.
    pub fn cleanup(&self) {
        self.pending
            .retain(|_, v| v.created_at.elapsed() <= HANDOFF_TTL);
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                store.cleanup();
            }
        })
    }
}

impl Default for HandoffStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Provider;

    fn identity(subject: &str) -> FederatedIdentity {
        FederatedIdentity {
            provider: Provider::Google,
            subject: subject.into(),
            email: "a@x.com".into(),
            nickname: "a".into(),
            profile_url: None,
        }
    }

    #[test]
    fn code_is_consumed_on_first_take() {
        let store = HandoffStore::new();
        let code = store.issue(identity("sub-1"));

        let taken = store.take(&code);
        assert!(taken.is_some());
        assert_eq!(taken.unwrap().subject, "sub-1");

        // Second take returns None (consumed)
        assert!(store.take(&code).is_none());
    }

    #[test]
    fn expired_code_behaves_like_unknown_code() {
        let store = HandoffStore::new();
        store.pending.insert(
            "old-code".into(),
            PendingLogin {
                identity: identity("sub-1"),
                created_at: Instant::now() - Duration::from_secs(400), // past TTL
            },
        );

        assert!(store.take("old-code").is_none());
        assert!(store.take("never-issued").is_none());
    }

    #[test]
    fn cleanup_removes_expired() {
        let store = HandoffStore::new();
        let fresh = store.issue(identity("fresh"));
        store.pending.insert(
            "stale".into(),
            PendingLogin {
                identity: identity("stale"),
                created_at: Instant::now() - Duration::from_secs(400),
            },
        );

        store.cleanup();
        assert!(store.take(&fresh).is_some());
        assert!(store.take("stale").is_none());
    }

    #[tokio::test]
    async fn spawn_cleanup_task_runs() {
        let store = std::sync::Arc::new(HandoffStore::new());
        let handle = store.spawn_cleanup_task();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
    }
}
