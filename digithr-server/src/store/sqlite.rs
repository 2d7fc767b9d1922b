//! SQLite-based storage implementation

use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use digithr_core::user::{NewUser, UserChanges};
use digithr_core::{
    MaintenanceSchedule, Notification, Page, PageRequest, ProductionActivity, Record, RecordId,
    SecurityAlert, User, UserFilter, UserId,
};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{
    Repository, Session, SessionId, SessionStore, StoreResult, UserStore, EMAIL_TAKEN,
    USERNAME_TAKEN,
};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str = "id, username, password_hash, name, email, role, department, \
     is_active, last_login_at, created_at, updated_at, created_by";

const SESSION_COLUMNS: &str = "id, user_id, username, role, name, created_at, expires_at";

/// SQLite-based store implementing the credential store, the session store
/// and all four resource repositories
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// A private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, ApiError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                role TEXT NOT NULL,
                department TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                last_login_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by INTEGER REFERENCES users(id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                username TEXT NOT NULL,
                role TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

            CREATE TABLE IF NOT EXISTS production_activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                responsible TEXT NOT NULL,
                status TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS maintenance_schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                machine TEXT NOT NULL,
                type TEXT NOT NULL,
                description TEXT NOT NULL,
                scheduled_date TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS security_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                zone TEXT NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL,
                resolved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                type TEXT NOT NULL,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

/// Fixed-width RFC 3339, so text comparison orders like time.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn column_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn column_optional_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => column_timestamp(row, idx).map(Some),
        None => Ok(None),
    }
}

fn column_enum<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        role: column_enum(row, 5)?,
        department: row.get(6)?,
        is_active: row.get(7)?,
        last_login_at: column_optional_timestamp(row, 8)?,
        created_at: column_timestamp(row, 9)?,
        updated_at: column_timestamp(row, 10)?,
        created_by: row.get::<_, Option<i64>>(11)?.map(UserId),
    })
}

fn session_from_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: SessionId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        username: row.get(2)?,
        role: column_enum(row, 3)?,
        name: row.get(4)?,
        created_at: column_timestamp(row, 5)?,
        expires_at: column_timestamp(row, 6)?,
    })
}

/// Turn a UNIQUE violation on `users` into a `Conflict`.
fn user_write_error(e: rusqlite::Error) -> ApiError {
    if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            let msg = msg.as_deref().unwrap_or_default();
            if msg.contains("users.email") {
                return ApiError::Conflict(EMAIL_TAKEN.to_string());
            }
            if msg.contains("users.username") {
                return ApiError::Conflict(USERNAME_TAKEN.to_string());
            }
        }
    }
    ApiError::Internal(e.to_string())
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn get_user_locked(conn: &Connection, id: UserId) -> StoreResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.0],
            user_from_row,
        )
        .optional()?)
}

impl UserStore for SqliteStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = timestamp(&Utc::now());

        conn.execute(
            "INSERT INTO users (username, password_hash, name, email, role, department, \
             is_active, created_at, updated_at, created_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9)",
            params![
                new.username,
                new.password_hash,
                new.name,
                new.email,
                new.role.as_str(),
                new.department,
                new.is_active,
                now,
                new.created_by.map(|id| id.0),
            ],
        )
        .map_err(user_write_error)?;

        let id = UserId(conn.last_insert_rowid());
        get_user_locked(&conn, id)?
            .ok_or_else(|| ApiError::Internal(format!("user {id} vanished after insert")))
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        get_user_locked(&conn, id)
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?)
    }

    fn update_user(&self, id: UserId, changes: UserChanges) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let Some(mut user) = get_user_locked(&conn, id)? else {
            return Ok(None);
        };
        changes.apply(&mut user);
        user.updated_at = Utc::now();

        conn.execute(
            "UPDATE users SET name = ?2, email = ?3, role = ?4, department = ?5, \
             is_active = ?6, password_hash = ?7, updated_at = ?8 WHERE id = ?1",
            params![
                id.0,
                user.name,
                user.email,
                user.role.as_str(),
                user.department,
                user.is_active,
                user.password_hash,
                timestamp(&user.updated_at),
            ],
        )
        .map_err(user_write_error)?;

        get_user_locked(&conn, id)
    }

    fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn list_users(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(role) = filter.role {
            clauses.push("role = ?");
            values.push(Value::Text(role.as_str().to_string()));
        }
        if let Some(active) = filter.is_active {
            clauses.push("is_active = ?");
            values.push(Value::Integer(active as i64));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            clauses.push(
                "(LOWER(username) LIKE ? ESCAPE '\\' OR LOWER(name) LIKE ? ESCAPE '\\' \
                 OR LOWER(COALESCE(email, '')) LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(search);
            for _ in 0..3 {
                values.push(Value::Text(pattern.clone()));
            }
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock().unwrap();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM users{where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        // SQLite reads a negative OFFSET as 0.
        values.push(Value::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX)));
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users{where_clause} ORDER BY id LIMIT ? OFFSET ?"
        ))?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }

    fn record_login(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET last_login_at = ?2 WHERE id = ?1",
            params![id.0, timestamp(&at)],
        )?;
        Ok(())
    }

    fn count_users(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user: &User, ttl: chrono::Duration) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let session = Session::new(user, ttl);

        conn.execute(
            &format!("INSERT INTO sessions ({SESSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                session.id.0,
                session.user_id.0,
                session.username,
                session.role.as_str(),
                session.name,
                timestamp(&session.created_at),
                timestamp(&session.expires_at),
            ],
        )?;

        Ok(session)
    }

    fn get(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id.0],
                session_from_row,
            )
            .optional()?;

        match session {
            Some(session) if session.is_expired(Utc::now()) => {
                conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.0])?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn delete(&self, id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.0])?;
        Ok(())
    }

    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id.0])?;
        Ok(removed as u64)
    }

    fn purge_expired(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![timestamp(&Utc::now())],
        )?;
        Ok(removed as u64)
    }
}

/// Row mapping for a resource table. `COLUMNS` excludes `id`, which is
/// always the first selected column.
pub trait SqlRecord: Record {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order.
    fn values(&self) -> Vec<Value>;

    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn instant(dt: &DateTime<Utc>) -> Value {
    Value::Text(timestamp(dt))
}

impl SqlRecord for ProductionActivity {
    const TABLE: &'static str = "production_activities";
    const COLUMNS: &'static [&'static str] = &["name", "responsible", "status", "date", "created_at"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.responsible),
            text(self.status.as_str()),
            instant(&self.date),
            instant(&self.created_at),
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            responsible: row.get(2)?,
            status: column_enum(row, 3)?,
            date: column_timestamp(row, 4)?,
            created_at: column_timestamp(row, 5)?,
        })
    }
}

impl SqlRecord for MaintenanceSchedule {
    const TABLE: &'static str = "maintenance_schedules";
    const COLUMNS: &'static [&'static str] = &[
        "machine",
        "type",
        "description",
        "scheduled_date",
        "status",
        "created_at",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.machine),
            text(self.kind.as_str()),
            text(&self.description),
            instant(&self.scheduled_date),
            text(self.status.as_str()),
            instant(&self.created_at),
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            machine: row.get(1)?,
            kind: column_enum(row, 2)?,
            description: row.get(3)?,
            scheduled_date: column_timestamp(row, 4)?,
            status: column_enum(row, 5)?,
            created_at: column_timestamp(row, 6)?,
        })
    }
}

impl SqlRecord for SecurityAlert {
    const TABLE: &'static str = "security_alerts";
    const COLUMNS: &'static [&'static str] =
        &["type", "zone", "message", "severity", "resolved", "created_at"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.kind),
            text(&self.zone),
            text(&self.message),
            text(self.severity.as_str()),
            Value::Integer(self.resolved as i64),
            instant(&self.created_at),
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            zone: row.get(2)?,
            message: row.get(3)?,
            severity: column_enum(row, 4)?,
            resolved: row.get(5)?,
            created_at: column_timestamp(row, 6)?,
        })
    }
}

impl SqlRecord for Notification {
    const TABLE: &'static str = "notifications";
    const COLUMNS: &'static [&'static str] = &["title", "message", "type", "read", "created_at"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.title),
            text(&self.message),
            text(self.kind.as_str()),
            Value::Integer(self.read as i64),
            instant(&self.created_at),
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            message: row.get(2)?,
            kind: column_enum(row, 3)?,
            read: row.get(4)?,
            created_at: column_timestamp(row, 5)?,
        })
    }
}

fn select_sql<T: SqlRecord>() -> String {
    format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}

fn get_record_locked<T: SqlRecord>(conn: &Connection, id: RecordId) -> StoreResult<Option<T>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE id = ?1", select_sql::<T>()),
            params![id],
            T::from_row,
        )
        .optional()?)
}

impl<T: SqlRecord> Repository<T> for SqliteStore {
    fn list(&self) -> StoreResult<Vec<T>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", select_sql::<T>()))?;
        let records = stmt
            .query_map([], T::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<T>> {
        let conn = self.conn.lock().unwrap();
        get_record_locked(&conn, id)
    }

    fn insert(&self, draft: T::Draft) -> StoreResult<T> {
        // The placeholder id is discarded; the table assigns the real one.
        let record = T::from_draft(0, draft, Utc::now());
        let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");

        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                T::TABLE,
                T::COLUMNS.join(", ")
            ),
            params_from_iter(record.values()),
        )?;

        let id = conn.last_insert_rowid();
        get_record_locked(&conn, id)?.ok_or_else(|| {
            ApiError::Internal(format!("{} {id} vanished after insert", T::TABLE))
        })
    }

    fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<Option<T>> {
        let conn = self.conn.lock().unwrap();
        let Some(mut record) = get_record_locked::<T>(&conn, id)? else {
            return Ok(None);
        };
        record.apply(patch);

        let assignments = T::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values = record.values();
        values.push(Value::Integer(id));
        conn.execute(
            &format!("UPDATE {} SET {assignments} WHERE id = ?", T::TABLE),
            params_from_iter(values),
        )?;

        Ok(Some(record))
    }

    fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), params![id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use digithr_core::maintenance::MaintenanceScheduleInput;
    use digithr_core::notification::NotificationDraft;
    use digithr_core::{NotificationType, Role};
    use tempfile::TempDir;

    use super::*;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    fn new_user(username: &str, email: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hashed_password".to_string(),
            name: "Test User".to_string(),
            email: email.map(str::to_string),
            role: Role::Operateur,
            department: Some("Production".to_string()),
            is_active: true,
            created_by: None,
        }
    }

    #[test]
    fn test_create_and_fetch_user() {
        let (store, _dir) = create_test_store();

        let user = store.create_user(new_user("op1", Some("op1@ocp.ma"))).unwrap();
        let fetched = store.get_user_by_username("op1").unwrap().unwrap();

        assert_eq!(fetched, user);
        assert_eq!(fetched.role, Role::Operateur);
        assert_eq!(fetched.department.as_deref(), Some("Production"));
    }

    #[test]
    fn test_duplicate_username_and_email_conflict() {
        let (store, _dir) = create_test_store();
        store.create_user(new_user("op1", Some("op1@ocp.ma"))).unwrap();

        let result = store.create_user(new_user("op1", None));
        assert!(matches!(result, Err(ApiError::Conflict(msg)) if msg == USERNAME_TAKEN));

        let result = store.create_user(new_user("op2", Some("op1@ocp.ma")));
        assert!(matches!(result, Err(ApiError::Conflict(msg)) if msg == EMAIL_TAKEN));
    }

    #[test]
    fn test_update_user_partial() {
        let (store, _dir) = create_test_store();
        let user = store.create_user(new_user("op1", Some("op1@ocp.ma"))).unwrap();

        let updated = store
            .update_user(
                user.id,
                UserChanges {
                    role: Some(Role::Superviseur),
                    department: Some(None),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, Role::Superviseur);
        assert_eq!(updated.department, None);
        assert_eq!(updated.email.as_deref(), Some("op1@ocp.ma"));
        assert!(updated.updated_at >= user.updated_at);
        assert!(store
            .update_user(UserId(999), UserChanges::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let (store, _dir) = create_test_store();
        store.create_user(new_user("abc_def", None)).unwrap();
        store.create_user(new_user("abcxdef", None)).unwrap();

        let filter = UserFilter {
            search: Some("C_D".to_string()),
            ..Default::default()
        };
        let page = store.list_users(&filter, PageRequest::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].username, "abc_def");
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let (store, _dir) = create_test_store();
        for name in ["op1", "op2", "op3"] {
            store.create_user(new_user(name, None)).unwrap();
        }

        let page = store
            .list_users(&UserFilter::default(), PageRequest::new(Some(u64::MAX), Some(10)))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);

        let page = store
            .list_users(&UserFilter::default(), PageRequest::new(Some(2), Some(2)))
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].username, "op3");
    }

    #[test]
    fn test_session_lifecycle() {
        let (store, _dir) = create_test_store();
        let user = store.create_user(new_user("op1", None)).unwrap();

        let session = SessionStore::create(&store, &user, chrono::Duration::hours(24)).unwrap();
        let fetched = SessionStore::get(&store, &session.id).unwrap().unwrap();
        assert_eq!(fetched.username, "op1");
        assert_eq!(fetched.role, Role::Operateur);

        SessionStore::delete(&store, &session.id).unwrap();
        SessionStore::delete(&store, &session.id).unwrap();
        assert!(SessionStore::get(&store, &session.id).unwrap().is_none());
    }

    #[test]
    fn test_purge_expired_sessions() {
        let (store, _dir) = create_test_store();
        let user = store.create_user(new_user("op1", None)).unwrap();

        SessionStore::create(&store, &user, chrono::Duration::seconds(-5)).unwrap();
        let live = SessionStore::create(&store, &user, chrono::Duration::hours(1)).unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(SessionStore::get(&store, &live.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_user_cascades() {
        let (store, _dir) = create_test_store();
        let admin = store.create_user(new_user("admin", None)).unwrap();
        let mut child = new_user("child", None);
        child.created_by = Some(admin.id);
        let child = store.create_user(child).unwrap();
        let session = SessionStore::create(&store, &admin, chrono::Duration::hours(1)).unwrap();

        assert!(store.delete_user(admin.id).unwrap());
        assert!(!store.delete_user(admin.id).unwrap());

        assert!(SessionStore::get(&store, &session.id).unwrap().is_none());
        let child = store.get_user(child.id).unwrap().unwrap();
        assert_eq!(child.created_by, None);
    }

    #[test]
    fn test_repository_round_trip() {
        let (store, _dir) = create_test_store();
        let input = MaintenanceScheduleInput {
            machine: Some("Excavatrice CAT 320".to_string()),
            kind: Some("Préventive".to_string()),
            description: Some("Révision 500h".to_string()),
            scheduled_date: Some("2025-03-10".to_string()),
            status: None,
        };
        let draft = MaintenanceSchedule::validate_new(input).unwrap();

        let created: MaintenanceSchedule = store.insert(draft).unwrap();
        let fetched: MaintenanceSchedule = Repository::get(&store, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);

        let json = serde_json::to_value(&fetched).unwrap();
        assert_eq!(json["scheduledDate"], "2025-03-10T00:00:00.000Z");
        assert_eq!(json["type"], "Préventive");
    }

    #[test]
    fn test_repository_update_and_delete() {
        let (store, _dir) = create_test_store();
        let created: Notification = store
            .insert(NotificationDraft {
                title: "Alerte Sécurité".to_string(),
                message: "Détection de gaz en Zone 3".to_string(),
                kind: NotificationType::Error,
                read: false,
            })
            .unwrap();

        let patch = Notification::validate_patch(digithr_core::notification::NotificationInput {
            read: Some(true),
            ..Default::default()
        })
        .unwrap();
        let updated: Notification = store.update(created.id, patch).unwrap().unwrap();
        assert!(updated.read);
        assert_eq!(updated.title, created.title);

        assert!(Repository::<Notification>::delete(&store, created.id).unwrap());
        assert!(!Repository::<Notification>::delete(&store, created.id).unwrap());
        assert!(Repository::<Notification>::list(&store).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.db");
        let path = path.to_str().unwrap();

        let session_id = {
            let store = SqliteStore::open(path).unwrap();
            let user = store.create_user(new_user("op1", None)).unwrap();
            SessionStore::create(&store, &user, chrono::Duration::hours(1))
                .unwrap()
                .id
        };

        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.count_users().unwrap(), 1);
        assert!(SessionStore::get(&store, &session_id).unwrap().is_some());
    }
}
