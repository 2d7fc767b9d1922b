//! Role authorization gate
//!
//! Attached per route and per method with `from_fn_with_state`. Resolves the
//! session cookie, re-reads the account from the credential store and checks
//! the stored role against the route's policy before the handler runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use digithr_core::{Role, RoleSet, User, UserId};
use tower_cookies::Cookies;

use super::session::{clear_session_cookie, get_session_from_cookies};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

/// Who may reach a route
#[derive(Debug, Clone)]
pub enum Access {
    /// Any active session
    Authenticated,
    /// Listed roles, plus ADMIN
    Roles(RoleSet),
}

impl Access {
    pub fn admin_only() -> Self {
        Access::Roles(RoleSet::admin_only())
    }

    pub fn roles(roles: &[Role]) -> Self {
        Access::Roles(RoleSet::of(roles))
    }
}

/// Caller identity, inserted into request extensions for handlers
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Middleware state: the app plus one route's policy
pub struct Gate<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    state: Arc<AppState<U, S>>,
    access: Access,
}

impl<U, S> Gate<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    pub fn new(state: Arc<AppState<U, S>>, access: Access) -> Self {
        Self { state, access }
    }
}

impl<U, S> Clone for Gate<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            access: self.access.clone(),
        }
    }
}

pub async fn authorize<U, S>(
    State(gate): State<Gate<U, S>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
{
    let state = &gate.state;
    let session = get_session_from_cookies(&cookies, &state.cookie_key, state.session_store.as_ref())?
        .ok_or(ApiError::Unauthenticated)?;

    // The session only snapshots the identity; decide on the stored account.
    let user = match state.user_store.get_user(session.user_id)? {
        Some(user) if user.is_active => user,
        _ => {
            tracing::info!(
                user_id = %session.user_id,
                username = %session.username,
                "Dropping session of deleted or disabled account"
            );
            state.session_store.delete(&session.id)?;
            clear_session_cookie(&cookies);
            return Err(ApiError::Unauthenticated);
        }
    };

    if let Access::Roles(allowed) = &gate.access {
        if !allowed.permits(user.role) {
            tracing::debug!(
                username = %user.username,
                role = %user.role,
                path = %request.uri().path(),
                "Role not permitted"
            );
            return Err(ApiError::Forbidden {
                required: allowed.required(),
                actual: user.role,
            });
        }
    }

    request.extensions_mut().insert(Identity::from(&user));
    Ok(next.run(request).await)
}
