//! User management endpoints (ADMIN only)

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use digithr_core::user::{
    check_user_deletion, CreateUserRequest, NewUser, UpdateUserRequest, UserChanges,
};
use digithr_core::{PageInfo, PageRequest, Role, User, UserFilter, UserId, ValidationErrors};
use serde::{Deserialize, Serialize};

use super::gate::Identity;
use crate::crypto::{generate_temporary_password, hash_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

const USER_NOT_FOUND: &str = "Utilisateur non trouvé";

/// Query string of `GET /api/users`. Kept as text so bad values map to our
/// own errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<String>,
}

impl ListUsersQuery {
    fn into_parts(self) -> Result<(UserFilter, PageRequest), ApiError> {
        let number = |v: Option<String>| v.and_then(|v| v.trim().parse::<u64>().ok());
        let page = PageRequest::new(number(self.page), number(self.limit));

        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(role) => Some(role.parse::<Role>().map_err(|_| {
                ValidationErrors::single("role", "Rôle utilisateur invalide")
            })?),
        };

        let is_active = match self.is_active.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(_) => {
                return Err(ValidationErrors::single(
                    "isActive",
                    "Valeur invalide (true ou false)",
                )
                .into())
            }
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok((
            UserFilter {
                role,
                is_active,
                search,
            },
            page,
        ))
    }
}

#[derive(Serialize)]
pub struct UserList {
    pub data: Vec<User>,
    pub pagination: PageInfo,
}

/// GET /api/users
pub async fn list_users<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UserList>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Query(query) = query?;
    let (filter, request) = query.into_parts()?;
    let page = state.user_store.list_users(&filter, request)?;

    Ok(Json(UserList {
        pagination: PageInfo::new(page.total, request),
        data: page.items,
    }))
}

/// GET /api/users/:id
pub async fn get_user<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    state
        .user_store
        .get_user(UserId(id))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))
}

/// A created user, plus the generated password when one was issued
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

/// POST /api/users
pub async fn create_user<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    Extension(admin): Extension<Identity>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Json(req) = body?;
    let draft = req.validate()?;

    let (password, temporary_password) = match draft.password {
        Some(password) => (password, None),
        None => {
            let generated = generate_temporary_password();
            (generated.clone(), Some(generated))
        }
    };
    let password_hash = hash_password(&password, state.settings.bcrypt_cost)?;

    let user = state.user_store.create_user(NewUser {
        username: draft.username,
        password_hash,
        name: draft.name,
        email: draft.email,
        role: draft.role,
        department: draft.department,
        is_active: draft.is_active,
        created_by: Some(admin.id),
    })?;

    tracing::info!(
        username = %user.username,
        role = %user.role,
        created_by = %admin.username,
        temporary_password = temporary_password.is_some(),
        "User created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            user,
            temporary_password,
        }),
    ))
}

/// PUT /api/users/:id
pub async fn update_user<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    Extension(admin): Extension<Identity>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    let Json(req) = body?;
    let update = req.validate()?;

    let password_hash = match &update.password {
        Some(password) => Some(hash_password(password, state.settings.bcrypt_cost)?),
        None => None,
    };
    let changes = UserChanges {
        name: update.name,
        email: update.email,
        role: update.role,
        department: update.department,
        is_active: update.is_active,
        password_hash,
    };

    let user = state
        .user_store
        .update_user(UserId(id), changes)?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    tracing::info!(
        username = %user.username,
        role = %user.role,
        is_active = user.is_active,
        updated_by = %admin.username,
        "User updated"
    );
    Ok(Json(user))
}

#[derive(Serialize)]
pub struct DeletedUser {
    pub message: String,
    pub id: UserId,
}

/// DELETE /api/users/:id
pub async fn delete_user<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    Extension(actor): Extension<Identity>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedUser>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    let target = state
        .user_store
        .get_user(UserId(id))?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    check_user_deletion(actor.id, actor.role, &target)?;

    if !state.user_store.delete_user(target.id)? {
        return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
    }
    let sessions = state.session_store.delete_for_user(target.id)?;

    tracing::info!(
        username = %target.username,
        deleted_by = %actor.username,
        sessions,
        "User deleted"
    );
    Ok(Json(DeletedUser {
        message: "Utilisateur supprimé avec succès".to_string(),
        id: target.id,
    }))
}
