//! In-memory session store with sliding expiry.
//!
//! Tokens are 32 CSPRNG bytes hex-encoded, so collisions are out of the
//! entropy budget and not special-cased. Expired entries are swept lazily on
//! every create/lookup, which keeps the store bounded by the active session
//! count at an O(entries) amortized cost per operation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use rand::RngCore;

use crate::models::session::SessionRecord;

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionRecord>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a session for `user_id` and hands back the opaque token.
    pub fn create(&self, user_id: i64, login_name: &str) -> String {
        let token = generate_token();
        let now = Utc::now();
        let record = SessionRecord {
            token: token.clone(),
            user_id,
            login_name: login_name.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.inner.write();
        sessions.retain(|_, existing| !existing.is_expired(now));
        sessions.insert(token.clone(), record);
        token
    }

    /// Resolves a token to its record, extending the expiry on success.
    ///
    /// An empty token, an unknown token, and an expired token all yield
    /// `None`; callers cannot distinguish the three cases.
    pub fn lookup(&self, token: &str) -> Option<SessionRecord> {
        if token.is_empty() {
            return None;
        }
        let now = Utc::now();
        let mut sessions = self.inner.write();
        sessions.retain(|_, existing| !existing.is_expired(now));
        let record = sessions.get_mut(token)?;
        record.expires_at = now + self.ttl;
        Some(record.clone())
    }

    /// Removes the session if present. Unknown or empty tokens are a no-op.
    pub fn destroy(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        self.inner.write().remove(token);
    }

    /// Drops every expired record. Idempotent; also runs implicitly inside
    /// `create` and `lookup`.
    pub fn sweep(&self) {
        let now = Utc::now();
        self.inner.write().retain(|_, existing| !existing.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn store_with_ttl_ms(ms: i64) -> SessionStore {
        SessionStore::new(Duration::milliseconds(ms))
    }

    #[test]
    fn create_then_lookup_returns_matching_record() {
        let store = store_with_ttl_ms(60_000);
        let token = store.create(7, "olena");
        let record = store.lookup(&token).expect("freshly created session");
        assert_eq!(record.user_id, 7);
        assert_eq!(record.login_name, "olena");
        assert_eq!(record.token, token);
    }

    #[test]
    fn token_is_256_bits_hex_encoded() {
        let store = store_with_ttl_ms(60_000);
        let token = store.create(1, "admin");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_token_lookup_is_none() {
        let store = store_with_ttl_ms(60_000);
        store.create(1, "admin");
        assert!(store.lookup("").is_none());
    }

    #[test]
    fn unknown_token_lookup_is_none() {
        let store = store_with_ttl_ms(60_000);
        assert!(store.lookup("deadbeef").is_none());
    }

    #[test]
    fn destroy_is_idempotent() {
        let store = store_with_ttl_ms(60_000);
        let token = store.create(1, "admin");
        store.destroy(&token);
        assert!(store.lookup(&token).is_none());
        store.destroy(&token);
        store.destroy("");
        assert!(store.lookup(&token).is_none());
    }

    #[test]
    fn distinct_users_get_distinct_sessions() {
        let store = store_with_ttl_ms(60_000);
        let first = store.create(1, "admin");
        let second = store.create(2, "olena");
        assert_ne!(first, second);
        assert_eq!(store.lookup(&first).unwrap().login_name, "admin");
        assert_eq!(store.lookup(&second).unwrap().login_name, "olena");
    }

    #[test]
    fn lookup_extends_expiry() {
        let store = store_with_ttl_ms(60_000);
        let token = store.create(1, "admin");
        let before = store.lookup(&token).unwrap().expires_at;
        std::thread::sleep(StdDuration::from_millis(15));
        let after = store.lookup(&token).unwrap().expires_at;
        assert!(after > before);
    }

    #[test]
    fn session_touched_within_ttl_survives() {
        let store = store_with_ttl_ms(100);
        let token = store.create(1, "admin");
        for _ in 0..4 {
            std::thread::sleep(StdDuration::from_millis(40));
            assert!(store.lookup(&token).is_some(), "touched session expired");
        }
    }

    #[test]
    fn idle_session_expires_and_sweep_removes_it() {
        let store = store_with_ttl_ms(20);
        let token = store.create(1, "admin");
        std::thread::sleep(StdDuration::from_millis(40));
        assert!(store.lookup(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_only_drops_expired_entries() {
        let store = store_with_ttl_ms(30);
        let stale = store.create(1, "admin");
        std::thread::sleep(StdDuration::from_millis(45));
        let fresh = store.create(2, "olena");
        store.sweep();
        assert_eq!(store.len(), 1);
        assert!(store.lookup(&stale).is_none());
        assert!(store.lookup(&fresh).is_some());
    }
}
