//! Storage abstractions: credentials, sessions and resource collections

pub mod memory;
pub mod models;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use digithr_core::user::{NewUser, UserChanges};
use digithr_core::{
    MaintenanceSchedule, Notification, Page, PageRequest, ProductionActivity, Record, RecordId,
    SecurityAlert, User, UserFilter, UserId,
};

pub use memory::{InMemoryRepository, InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

pub(crate) const USERNAME_TAKEN: &str = "Ce nom d'utilisateur existe déjà";
pub(crate) const EMAIL_TAKEN: &str = "Cette adresse email est déjà utilisée";

/// Credential store: owns user accounts
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` on a duplicate username or email.
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Apply a partial update and bump `updated_at`. `None` if unknown.
    fn update_user(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Remove a user; accounts it created keep existing with `created_by`
    /// cleared. Returns whether a row was removed.
    fn delete_user(&self, id: UserId) -> StoreResult<bool>;

    /// Filter first, then slice. Ordered by id.
    fn list_users(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>>;

    fn record_login(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()>;

    fn count_users(&self) -> StoreResult<u64>;
}

/// Session manager storage
pub trait SessionStore: Send + Sync {
    /// Open a session for a user, valid for `ttl`.
    fn create(&self, user: &User, ttl: chrono::Duration) -> StoreResult<Session>;

    /// Look up a live session. Expired sessions are removed and reported absent.
    fn get(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Idempotent.
    fn delete(&self, id: &SessionId) -> StoreResult<()>;

    /// Drop every session of a user; returns how many were removed.
    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64>;

    fn purge_expired(&self) -> StoreResult<u64>;
}

/// One resource collection
pub trait Repository<T: Record>: Send + Sync {
    /// Every record, in insertion order.
    fn list(&self) -> StoreResult<Vec<T>>;

    fn get(&self, id: RecordId) -> StoreResult<Option<T>>;

    /// Assign id and creation time, then store.
    fn insert(&self, draft: T::Draft) -> StoreResult<T>;

    /// Merge a patch into an existing record. `None` if unknown.
    fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<Option<T>>;

    /// Returns whether a record was removed.
    fn delete(&self, id: RecordId) -> StoreResult<bool>;
}

/// The four resource collections
#[derive(Clone)]
pub struct Repositories {
    pub production: Arc<dyn Repository<ProductionActivity>>,
    pub maintenance: Arc<dyn Repository<MaintenanceSchedule>>,
    pub alerts: Arc<dyn Repository<SecurityAlert>>,
    pub notifications: Arc<dyn Repository<Notification>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            production: Arc::new(InMemoryRepository::new()),
            maintenance: Arc::new(InMemoryRepository::new()),
            alerts: Arc::new(InMemoryRepository::new()),
            notifications: Arc::new(InMemoryRepository::new()),
        }
    }

    /// All four collections backed by one SQLite database.
    pub fn sqlite(store: Arc<SqliteStore>) -> Self {
        Self {
            production: store.clone(),
            maintenance: store.clone(),
            alerts: store.clone(),
            notifications: store,
        }
    }
}
