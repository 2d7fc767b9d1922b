//! Dashboard statistics

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use digithr_core::DashboardStats;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

/// GET /api/dashboard/stats
pub async fn stats<U, S>(
    State(state): State<Arc<AppState<U, S>>>,
) -> Result<Json<DashboardStats>, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    let repos = &state.repositories;
    let activities = repos.production.list()?;
    let schedules = repos.maintenance.list()?;
    let alerts = repos.alerts.list()?;

    Ok(Json(DashboardStats::compute(
        &activities,
        &schedules,
        &alerts,
        state.telemetry.diesel_usage(),
    )))
}
