//! Shared application state

use std::sync::Arc;

use digithr_core::{SimulatedTelemetry, TelemetryFeed};
use tower_cookies::Key;

use crate::config::Config;
use crate::store::{Repositories, SessionStore, UserStore};

/// Runtime knobs derived from [`Config`]
#[derive(Debug, Clone)]
pub struct Settings {
    /// Attach internal error text to 500 responses
    pub dev_mode: bool,
    pub bcrypt_cost: u32,
    pub session_ttl: chrono::Duration,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Allowed origins outside development
    pub cors_origins: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        let production = config.environment.is_production();
        Self {
            dev_mode: !production,
            bcrypt_cost: config.bcrypt_cost,
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
            secure_cookies: production,
            cors_origins: config.cors_origins.clone(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct AppState<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    pub user_store: Arc<U>,
    pub session_store: Arc<S>,
    pub repositories: Repositories,
    pub telemetry: Arc<dyn TelemetryFeed>,
    pub cookie_key: Key,
    pub settings: Settings,
}

impl<U, S> AppState<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    pub fn new(
        user_store: U,
        session_store: S,
        repositories: Repositories,
        cookie_key: Key,
        settings: Settings,
    ) -> Self {
        Self::new_with_arcs(
            Arc::new(user_store),
            Arc::new(session_store),
            repositories,
            cookie_key,
            settings,
        )
    }

    /// Like [`AppState::new`], for stores shared with something else
    /// (one SQLite store serves users, sessions and repositories).
    pub fn new_with_arcs(
        user_store: Arc<U>,
        session_store: Arc<S>,
        repositories: Repositories,
        cookie_key: Key,
        settings: Settings,
    ) -> Self {
        Self {
            user_store,
            session_store,
            repositories,
            telemetry: Arc::new(SimulatedTelemetry),
            cookie_key,
            settings,
        }
    }

    /// Replace the diesel telemetry source.
    pub fn with_telemetry(mut self, telemetry: impl TelemetryFeed + 'static) -> Self {
        self.telemetry = Arc::new(telemetry);
        self
    }
}

