//! Authentication endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use digithr_core::user::{check_password, UserChanges};
use digithr_core::{User, ValidationErrors};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::gate::Identity;
use super::session::{clear_session_cookie, session_id_from_cookies, set_session_cookie};
use crate::crypto::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login
pub async fn login<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    cookies: Cookies,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Json(req) = body?;
    let username = req.username.map(|u| u.trim().to_string()).unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Nom d'utilisateur et mot de passe requis".to_string(),
        ));
    }

    let Some(mut user) = state.user_store.get_user_by_username(&username)? else {
        tracing::info!(%username, "Login failed: unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!(%username, "Login failed: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    // Disabled accounts are only revealed to callers holding the password.
    if !user.is_active {
        tracing::warn!(%username, "Login refused: account disabled");
        return Err(ApiError::AccountDisabled);
    }

    let now = Utc::now();
    state.user_store.record_login(user.id, now)?;
    user.last_login_at = Some(now);

    let purged = state.session_store.purge_expired()?;
    if purged > 0 {
        tracing::debug!(purged, "Purged expired sessions");
    }

    let session = state.session_store.create(&user, state.settings.session_ttl)?;
    set_session_cookie(
        &cookies,
        &state.cookie_key,
        &session,
        state.settings.secure_cookies,
    );

    tracing::info!(%username, role = %user.role, "Login succeeded");
    Ok(Json(user))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/logout
pub async fn logout<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    cookies: Cookies,
) -> Result<Json<MessageResponse>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    if let Some(session_id) = session_id_from_cookies(&cookies, &state.cookie_key) {
        state.session_store.delete(&session_id)?;
    }

    clear_session_cookie(&cookies);

    Ok(Json(MessageResponse {
        message: "Déconnexion réussie".to_string(),
    }))
}

/// GET /api/auth/me
pub async fn me<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    state
        .user_store
        .get_user(identity.id)?
        .map(Json)
        .ok_or(ApiError::Unauthenticated)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// PUT /api/auth/password
pub async fn change_password<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Json(req) = body?;

    let mut errors = ValidationErrors::new();
    let current = req.current_password.unwrap_or_default();
    if current.is_empty() {
        errors.add("currentPassword", "Le mot de passe actuel est requis");
    }
    let new_password = req.new_password.unwrap_or_default();
    if let Err(message) = check_password(&new_password) {
        errors.add("newPassword", message);
    }
    errors.into_result(())?;

    let user = state
        .user_store
        .get_user(identity.id)?
        .ok_or(ApiError::Unauthenticated)?;
    if !verify_password(&current, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let password_hash = hash_password(&new_password, state.settings.bcrypt_cost)?;
    state.user_store.update_user(
        user.id,
        UserChanges {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )?;

    tracing::info!(username = %user.username, "Password changed");
    Ok(Json(MessageResponse {
        message: "Mot de passe mis à jour".to_string(),
    }))
}
