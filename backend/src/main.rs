use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::Method,
    routing::{delete, get, post},
    Router,
};
use chrono::Local;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, Level};

mod config;
mod db;
mod domain;
mod error;
mod rest;
mod store;

use config::Config;
use db::DbConnection;
use domain::session::SessionService;
use rest::AppState;
use store::AttendanceStore;

/// How often the period filter is re-evaluated against the clock.
const FILTER_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Arc::new(Config::load());

    info!("Setting up database");
    let db = DbConnection::connect_with_retry(&config.database_url).await?;
    let store = Arc::new(AttendanceStore::new(db).await?);
    let session = Arc::new(SessionService::new(store.clone(), config.clone()));

    // Live subscription: rebuild today's working set on every store change,
    // starting from the snapshot already in the feed.
    let mut feed = store.subscribe();
    {
        let session = session.clone();
        tokio::spawn(async move {
            loop {
                let snapshot = feed.borrow_and_update().clone();
                if let Err(e) = session.apply_snapshot(&snapshot).await {
                    error!("failed to apply store snapshot: {e:#}");
                }
                if feed.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    // Time-driven filter refresh. The first tick fires immediately and is
    // skipped; the startup default is already in place.
    {
        let session = session.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(FILTER_REFRESH_INTERVAL);
            tick.tick().await;
            loop {
                tick.tick().await;
                session.refresh_filter(Local::now()).await;
            }
        });
    }

    // Single-room, trust-the-network tool: any origin on the local network
    // may call the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let state = AppState { session, store };

    let api_routes = Router::new()
        .route("/signin", post(rest::sign_in))
        .route("/roster", get(rest::get_roster))
        .route("/filter", get(rest::get_filter).put(rest::set_filter))
        .route("/attendance/:id", delete(rest::delete_record))
        .route("/attendance", delete(rest::clear_attendance))
        .route("/export", get(rest::export_attendance))
        .route("/session", get(rest::get_session));

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&config.static_root))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
