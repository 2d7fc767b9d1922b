//! DIGI THR API server
//!
//! Session-authenticated REST backend of the mining-site supervision
//! dashboard: user management, production, maintenance, security alerts,
//! notifications and dashboard statistics, gated by role.

pub mod config;
pub mod crypto;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

pub use config::{Config, Environment};
pub use error::ApiError;
pub use state::{AppState, Settings};
pub use store::{
    InMemoryRepository, InMemorySessionStore, InMemoryUserStore, Repositories, Repository,
    SessionStore, SqliteStore, UserStore,
};
