//! CRUD endpoints shared by the four resource collections

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use digithr_core::{
    MaintenanceSchedule, Notification, ProductionActivity, Record, RecordId, SecurityAlert,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Repositories, Repository, SessionStore, UserStore};

/// A record type with a collection in [`Repositories`]
pub trait Collection: Record {
    fn repository(repos: &Repositories) -> &dyn Repository<Self>;
}

impl Collection for ProductionActivity {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.production.as_ref()
    }
}

impl Collection for MaintenanceSchedule {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.maintenance.as_ref()
    }
}

impl Collection for SecurityAlert {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.alerts.as_ref()
    }
}

impl Collection for Notification {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.notifications.as_ref()
    }
}

fn not_found<T: Record>(id: RecordId) -> ApiError {
    ApiError::NotFound(format!("{} {id} introuvable", T::LABEL))
}

pub async fn list<T, U, S>(
    State(state): State<Arc<AppState<U, S>>>,
) -> Result<Json<Vec<T>>, ApiError>
where
    T: Collection,
    U: UserStore,
    S: SessionStore,
{
    Ok(Json(T::repository(&state.repositories).list()?))
}

pub async fn get_one<T, U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<T>, ApiError>
where
    T: Collection,
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    T::repository(&state.repositories)
        .get(id)?
        .map(Json)
        .ok_or_else(|| not_found::<T>(id))
}

pub async fn create<T, U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    body: Result<Json<T::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<T>), ApiError>
where
    T: Collection,
    U: UserStore,
    S: SessionStore,
{
    let Json(input) = body?;
    let draft = T::validate_new(input)?;
    let record = T::repository(&state.repositories).insert(draft)?;

    tracing::info!(resource = T::LABEL, id = record.id(), "Record created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<T, U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    id: Result<Path<RecordId>, PathRejection>,
    body: Result<Json<T::Input>, JsonRejection>,
) -> Result<Json<T>, ApiError>
where
    T: Collection,
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    let Json(input) = body?;
    let patch = T::validate_patch(input)?;
    let record = T::repository(&state.repositories)
        .update(id, patch)?
        .ok_or_else(|| not_found::<T>(id))?;

    tracing::debug!(resource = T::LABEL, id, "Record updated");
    Ok(Json(record))
}

pub async fn delete<T, U, S>(
    State(state): State<Arc<AppState<U, S>>>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
    T: Collection,
    U: UserStore,
    S: SessionStore,
{
    let Path(id) = id?;
    if !T::repository(&state.repositories).delete(id)? {
        return Err(not_found::<T>(id));
    }

    tracing::info!(resource = T::LABEL, id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}
