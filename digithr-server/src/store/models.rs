//! Session records held by a session store

use chrono::{DateTime, Utc};
use digithr_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};

/// Opaque session token, as carried (signed) in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }
}

/// A login session. The identity fields are a snapshot taken at login;
/// the gate re-reads the user on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: &User, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            name: user.name.clone(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
