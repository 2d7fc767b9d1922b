//! In-memory storage implementations

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use digithr_core::user::{NewUser, UserChanges};
use digithr_core::{Page, PageRequest, Record, RecordId, User, UserFilter, UserId};

use super::{
    Repository, Session, SessionId, SessionStore, StoreResult, UserStore, EMAIL_TAKEN,
    USERNAME_TAKEN,
};
use crate::error::ApiError;

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<UserId, User>>,
    next_user_id: AtomicI64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_user_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn email_taken(users: &BTreeMap<UserId, User>, email: &str, except: Option<UserId>) -> bool {
    users
        .values()
        .any(|u| Some(u.id) != except && u.email.as_deref() == Some(email))
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.username == new.username) {
            return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
        }
        if let Some(email) = &new.email {
            if email_taken(&users, email, None) {
                return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
            }
        }

        let now = Utc::now();
        let user = User {
            id: UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst)),
            username: new.username,
            password_hash: new.password_hash,
            name: new.name,
            email: new.email,
            role: new.role,
            department: new.department,
            is_active: new.is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            created_by: new.created_by,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    fn update_user(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().unwrap();
        if !users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(Some(email)) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut users = self.users.write().unwrap();
        if users.remove(&id).is_none() {
            return Ok(false);
        }
        for user in users.values_mut() {
            if user.created_by == Some(id) {
                user.created_by = None;
            }
        }
        Ok(true)
    }

    fn list_users(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>> {
        let users = self.users.read().unwrap();
        let matching: Vec<&User> = users.values().filter(|u| filter.matches(u)).collect();
        let total = matching.len() as u64;
        let items = page.slice(matching.into_iter().cloned());
        Ok(Page { items, total })
    }

    fn record_login(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.users.write().unwrap().get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    fn count_users(&self) -> StoreResult<u64> {
        Ok(self.users.read().unwrap().len() as u64)
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user: &User, ttl: chrono::Duration) -> StoreResult<Session> {
        let session = Session::new(user, ttl);
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let session = self.sessions.read().unwrap().get(id).cloned();
        match session {
            Some(session) if session.is_expired(Utc::now()) => {
                self.sessions.write().unwrap().remove(id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn delete(&self, id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(id);
        Ok(())
    }

    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    fn purge_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory resource collection. Ids start at 1 and are never reused.
pub struct InMemoryRepository<T: Record> {
    records: RwLock<BTreeMap<RecordId, T>>,
    next_id: AtomicI64,
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn list(&self) -> StoreResult<Vec<T>> {
        Ok(self.records.read().unwrap().values().cloned().collect())
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<T>> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    fn insert(&self, draft: T::Draft) -> StoreResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = T::from_draft(id, draft, Utc::now());
        self.records.write().unwrap().insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<Option<T>> {
        let mut records = self.records.write().unwrap();
        Ok(records.get_mut(&id).map(|record| {
            record.apply(patch);
            record.clone()
        }))
    }

    fn delete(&self, id: RecordId) -> StoreResult<bool> {
        Ok(self.records.write().unwrap().remove(&id).is_some())
    }
}
