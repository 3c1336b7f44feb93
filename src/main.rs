//! Study room backend binary entrypoint wiring REST, storage, and state.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use study_room_back::{
    config::AppConfig,
    dao::room_store::memory::MemoryRoomStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    bootstrap_storage(&app_state).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick a storage backend: a supervised CouchDB connection when one is
/// configured, the in-memory store otherwise.
async fn bootstrap_storage(state: &SharedState) {
    #[cfg(feature = "couch-store")]
    {
        use study_room_back::{
            dao::{
                room_store::{
                    RoomStore,
                    couchdb::{CouchConfig, CouchRoomStore},
                },
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        if env::var("COUCH_BASE_URL").is_ok() {
            info!("CouchDB configured; starting storage supervisor");
            tokio::spawn(storage_supervisor::run(state.clone(), move || async move {
                let config = CouchConfig::from_env()
                    .map_err(|err| StorageError::unavailable(err.to_string(), err))?;
                let store = CouchRoomStore::connect(config)
                    .await
                    .map_err(|err| StorageError::unavailable(err.to_string(), err))?;
                Ok(Arc::new(store) as Arc<dyn RoomStore>)
            }));
            return;
        }
    }

    info!("no external store configured; using the in-memory room store");
    state
        .install_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
