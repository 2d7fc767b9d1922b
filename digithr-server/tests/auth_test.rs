//! Login, logout, current user and password change

mod common;

use common::{create_test_app, create_test_server, login, login_admin, session_cookie};
use digithr_core::user::UserChanges;
use digithr_core::UserId;
use digithr_server::UserStore;
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_returns_user_and_sets_cookie() {
    let server = create_test_server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "admin123" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "ADMIN");
    assert!(body["lastLoginAt"].is_string());
    assert!(body.get("passwordHash").is_none());

    let cookie = response.maybe_cookie("digithr_session").expect("No session cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let server = create_test_server();
    let cookie = login(&server, "abdelfattah", "abdelfattah ocp").await;

    let response = server
        .get("/api/auth/me")
        .add_cookie(session_cookie(&cookie))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["username"], "abdelfattah");
    assert_eq!(body["role"], "SUPERVISEUR");
}

#[tokio::test]
async fn test_me_without_cookie_is_unauthorized() {
    let server = create_test_server();

    let response = server.get("/api/auth/me").await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let server = create_test_server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "mauvais-mot" }))
        .await;

    assert_eq!(response.status_code(), 401);
    assert!(response.maybe_cookie("digithr_session").is_none());
}

#[tokio::test]
async fn test_unknown_user_is_rejected_like_wrong_password() {
    let server = create_test_server();

    let unknown = server
        .post("/api/auth/login")
        .json(&json!({ "username": "fantome", "password": "admin123" }))
        .await;
    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin", "password": "fantome123" }))
        .await;

    assert_eq!(unknown.status_code(), 401);
    let unknown: Value = unknown.json();
    let wrong: Value = wrong.json();
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "admin" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "  ", "password": "admin123" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/api/auth/login")
        .text("{ not json")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_disabled_account_cannot_log_in() {
    let (server, state) = create_test_app();
    let securite = state
        .user_store
        .get_user_by_username("securite")
        .unwrap()
        .unwrap();
    state
        .user_store
        .update_user(
            securite.id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "securite", "password": "securite123" }))
        .await;

    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["error"], "Account disabled");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = create_test_server();
    let cookie = login_admin(&server).await;

    let response = server
        .post("/api/auth/logout")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Déconnexion réussie");

    let response = server
        .get("/api/auth/me")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let server = create_test_server();

    let response = server.post("/api/auth/logout").await;

    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_each_login_gets_its_own_session() {
    let server = create_test_server();
    let first = login_admin(&server).await;
    let second = login_admin(&server).await;
    assert_ne!(first, second);

    server
        .post("/api/auth/logout")
        .add_cookie(session_cookie(&first))
        .await;

    let response = server
        .get("/api/auth/me")
        .add_cookie(session_cookie(&second))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_change_password() {
    let server = create_test_server();
    let cookie = login(&server, "securite", "securite123").await;

    let response = server
        .put("/api/auth/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "currentPassword": "securite123",
            "newPassword": "nouveau-secret",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "securite", "password": "securite123" }))
        .await;
    assert_eq!(response.status_code(), 401);

    login(&server, "securite", "nouveau-secret").await;
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let server = create_test_server();
    let cookie = login(&server, "securite", "securite123").await;

    let response = server
        .put("/api/auth/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "currentPassword": "pas-le-bon",
            "newPassword": "nouveau-secret",
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_change_password_rejects_short_password() {
    let server = create_test_server();
    let cookie = login(&server, "securite", "securite123").await;

    let response = server
        .put("/api/auth/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "currentPassword": "securite123",
            "newPassword": "court",
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["details"]["newPassword"].is_string());
}

#[tokio::test]
async fn test_login_updates_last_login() {
    let (server, state) = create_test_app();
    let before = state.user_store.get_user(UserId(1)).unwrap().unwrap();
    assert!(before.last_login_at.is_none());

    login_admin(&server).await;

    let after = state.user_store.get_user(UserId(1)).unwrap().unwrap();
    assert!(after.last_login_at.is_some());
}

#[tokio::test]
async fn test_healthz_is_public() {
    let server = create_test_server();

    let response = server.get("/api/healthz").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = create_test_server();

    let response = server.get("/api/nulle-part").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "Route introuvable");
}
