//! DIGI THR API server

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower_cookies::Key;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digithr_server::crypto::derive_cookie_key;
use digithr_server::{
    routes, seed, AppState, Config, InMemorySessionStore, InMemoryUserStore, Repositories,
    SessionStore, Settings, SqliteStore, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "digithr_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    let cookie_key = match &config.session_secret {
        Some(secret) => derive_cookie_key(secret),
        None => {
            tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
            Key::generate()
        }
    };
    let settings = Settings::from_config(&config);

    match &config.database_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(%path, "Using SQLite storage");
            let state = AppState::new_with_arcs(
                store.clone(),
                store.clone(),
                Repositories::sqlite(store),
                cookie_key,
                settings,
            );
            serve(state, &config).await
        }
        None => {
            tracing::info!("Using in-memory storage; data is lost on exit");
            let state = AppState::new(
                InMemoryUserStore::new(),
                InMemorySessionStore::new(),
                Repositories::in_memory(),
                cookie_key,
                settings,
            );
            serve(state, &config).await
        }
    }
}

async fn serve<U, S>(state: AppState<U, S>, config: &Config) -> Result<()>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
{
    if config.seed && seed::seed_defaults(&state)? {
        tracing::info!("Default accounts: admin, abdelfattah, securite");
    }

    let app = routes::create_router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("DIGI THR API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}
