//! Organization leaderboard service.
//!
//! Ranks contributors of a GitHub organization by merged pull requests and serves the
//! latest ranking to the website.
//!
//!
//!
//! # General Infrastructure
//! - One process: a background refresh job plus a small HTTP server
//! - The two only meet at the snapshot file, nothing in memory is shared between them
//! - Refresh writes the file atomically, the server reads it on every request
//! - A failed or slow refresh never affects serving, clients just see an older `updatedAt`
//!
//!
//!
//! # Start-up
//! 1. Load configuration from the environment
//! 2. Reset the snapshot file to the empty default so nothing from an earlier deployment leaks out
//! 3. Kick off one refresh in the background
//! 4. Register the daily cron job
//! 5. Serve
//!
//!
//!
//! # Endpoints
//!
//! Liveness.
//! ```sh
//! curl http://localhost:5000/
//! ```
//!
//! Current snapshot, always `200`. Check `generated` and `success` in the body.
//! ```sh
//! curl http://localhost:5000/Org_Leaderboard
//! ```
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `5000` |
//! | `LEADERBOARD_ORG` | `recodehive` |
//! | `GIT_TOKEN` | none, also read from `/run/secrets/GIT_TOKEN` |
//! | `LEADERBOARD_PATH` | `org_leaderboard.json` |
//! | `LEADERBOARD_CRON` | `0 0 0 * * *` |
//! | `LEADERBOARD_THROTTLE_MS` | `3000` |
//! | `GITHUB_TIMEOUT_SECS` | `30` |
//! | `GITHUB_API_URL` | `https://api.github.com` |
//!
//! Logs follow `RUST_LOG`.
//! ```sh
//! RUST_LOG=info,process=debug cargo run -p leaderboard
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;

use error::AppError;
use routes::{leaderboard_handler, root_handler};
use scheduler::{refresh, start_scheduler};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(root_handler))
        .route("/Org_Leaderboard", get(leaderboard_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new()?;

    match state.store.reset() {
        Ok(()) => info!("{} was reset", state.store.path().display()),
        Err(e) => error!("Failed to reset {}: {e}", state.store.path().display()),
    }

    tokio::spawn(refresh(state.clone()));
    let mut scheduler = start_scheduler(state.clone()).await?;

    info!("Starting server...");

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    scheduler.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
