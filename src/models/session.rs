use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side session state for one logged-in principal. Owned exclusively by
/// the session store; handlers only ever see clones scoped to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: i64,
    /// Display name copied from the users table at login, not re-fetched.
    pub login_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
