//! Common test utilities for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use digithr_core::stats::FixedTelemetry;
use digithr_server::{
    routes, seed, AppState, InMemorySessionStore, InMemoryUserStore, Repositories, Settings,
};
use serde_json::{json, Value};
use tower_cookies::Key;

pub const SESSION_COOKIE: &str = "digithr_session";
pub const DIESEL_USAGE: u64 = 15_500;

pub type TestState = AppState<InMemoryUserStore, InMemorySessionStore>;

pub fn test_settings() -> Settings {
    Settings {
        bcrypt_cost: 4,
        ..Settings::default()
    }
}

/// Seeded in-memory server, plus its state for direct store access
pub fn create_test_app() -> (TestServer, Arc<TestState>) {
    let state = AppState::new(
        InMemoryUserStore::new(),
        InMemorySessionStore::new(),
        Repositories::in_memory(),
        Key::from(&[7u8; 64]),
        test_settings(),
    )
    .with_telemetry(FixedTelemetry(DIESEL_USAGE));
    seed::seed_defaults(&state).expect("seeding failed");

    let state = Arc::new(state);
    let app = routes::create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, state)
}

pub fn create_test_server() -> TestServer {
    create_test_app().0
}

pub fn session_cookie(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(SESSION_COOKIE, value.to_string())
}

/// Log in and return the signed session cookie value
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    assert_eq!(response.status_code(), 200, "login of {username} failed");

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

pub async fn login_admin(server: &TestServer) -> String {
    login(server, "admin", "admin123").await
}

/// Create an account through the API and return its JSON
pub async fn create_user_with_role(
    server: &TestServer,
    admin_cookie: &str,
    username: &str,
    password: &str,
    role: &str,
) -> Value {
    let response = server
        .post("/api/users")
        .add_cookie(session_cookie(admin_cookie))
        .json(&json!({
            "username": username,
            "password": password,
            "name": format!("Compte {username}"),
            "role": role,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "creating {username} failed");
    response.json()
}

/// Create an account with the given role and return its session cookie
pub async fn login_as_role(server: &TestServer, username: &str, role: &str) -> String {
    let admin = login_admin(server).await;
    create_user_with_role(server, &admin, username, "motdepasse1", role).await;
    login(server, username, "motdepasse1").await
}
