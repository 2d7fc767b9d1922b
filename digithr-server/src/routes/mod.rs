//! HTTP routes for the DIGI THR API

mod auth;
mod dashboard;
pub mod gate;
mod health;
pub mod resources;
pub mod session;
mod users;

use std::sync::Arc;

use axum::handler::Handler;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use digithr_core::{MaintenanceSchedule, Notification, ProductionActivity, Role, SecurityAlert};
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{expose_internal_details, ApiError};
use crate::state::{AppState, Settings};
use crate::store::{SessionStore, UserStore};
use gate::{authorize, Access, Gate};
use resources::Collection;

/// Create the router with all routes
pub fn create_router<U, S>(state: Arc<AppState<U, S>>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
{
    let guard = |access: Access| {
        from_fn_with_state(Gate::new(state.clone(), access), authorize::<U, S>)
    };
    let authenticated = || guard(Access::Authenticated);

    let mut router = Router::new()
        .route("/api/healthz", get(health::healthz))
        .route("/api/auth/login", post(auth::login::<U, S>))
        .route("/api/auth/logout", post(auth::logout::<U, S>))
        .route("/api/auth/me", get(auth::me::<U, S>.layer(authenticated())))
        .route(
            "/api/auth/password",
            put(auth::change_password::<U, S>.layer(authenticated())),
        )
        .route(
            "/api/users",
            get(users::list_users::<U, S>.layer(guard(Access::admin_only())))
                .post(users::create_user::<U, S>.layer(guard(Access::admin_only()))),
        )
        .route(
            "/api/users/:id",
            get(users::get_user::<U, S>.layer(guard(Access::admin_only())))
                .put(users::update_user::<U, S>.layer(guard(Access::admin_only())))
                .delete(users::delete_user::<U, S>.layer(guard(Access::admin_only()))),
        )
        .route(
            "/api/dashboard/stats",
            get(dashboard::stats::<U, S>.layer(authenticated())),
        );

    router = mount::<ProductionActivity, U, S>(
        router,
        "/api/production",
        &state,
        Policy {
            read: Access::Authenticated,
            create: Access::roles(&[Role::Superviseur, Role::Operateur]),
            update: Access::roles(&[Role::Superviseur, Role::Operateur]),
            delete: Access::roles(&[Role::Superviseur]),
        },
    );
    router = mount::<MaintenanceSchedule, U, S>(
        router,
        "/api/maintenance",
        &state,
        Policy {
            read: Access::Authenticated,
            create: Access::roles(&[Role::ChefMaintenance]),
            update: Access::roles(&[Role::ChefMaintenance]),
            delete: Access::roles(&[Role::ChefMaintenance]),
        },
    );
    router = mount::<SecurityAlert, U, S>(router, "/api/alerts", &state, Policy::open());
    router = mount::<Notification, U, S>(router, "/api/notifications", &state, Policy::open());

    let dev_mode = state.settings.dev_mode;
    let cors = cors_layer(&state.settings);
    router
        .fallback(|| async { ApiError::NotFound("Route introuvable".to_string()) })
        .layer(from_fn_with_state(dev_mode, expose_internal_details))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Per-method access for one resource collection
struct Policy {
    read: Access,
    create: Access,
    update: Access,
    delete: Access,
}

impl Policy {
    /// Any authenticated caller may do anything.
    fn open() -> Self {
        Self {
            read: Access::Authenticated,
            create: Access::Authenticated,
            update: Access::Authenticated,
            delete: Access::Authenticated,
        }
    }
}

fn mount<T, U, S>(
    router: Router<Arc<AppState<U, S>>>,
    base: &str,
    state: &Arc<AppState<U, S>>,
    policy: Policy,
) -> Router<Arc<AppState<U, S>>>
where
    T: Collection,
    U: UserStore + 'static,
    S: SessionStore + 'static,
{
    let guard = |access: Access| {
        from_fn_with_state(Gate::new(state.clone(), access), authorize::<U, S>)
    };

    router
        .route(
            base,
            get(resources::list::<T, U, S>.layer(guard(policy.read.clone())))
                .post(resources::create::<T, U, S>.layer(guard(policy.create))),
        )
        .route(
            &format!("{base}/:id"),
            get(resources::get_one::<T, U, S>.layer(guard(policy.read)))
                .put(resources::update::<T, U, S>.layer(guard(policy.update)))
                .delete(resources::delete::<T, U, S>.layer(guard(policy.delete))),
        )
}

/// Development mirrors any origin; otherwise only the configured list.
/// Credentials are allowed either way so the session cookie travels.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origin = if settings.dev_mode {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = settings
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                // `AllowOrigin::list` panics on a wildcard.
                Ok(value) if value != "*" => Some(value),
                _ => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
