use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use snapshot::LeaderboardSnapshot;
use tokio::task::spawn_blocking;
use tracing::{debug, error};

use crate::state::AppState;

pub async fn root_handler() -> &'static str {
    "Hello World"
}

/// Whatever is on disk right now, byte for byte. Never triggers or waits on a run.
pub async fn leaderboard_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Serving leaderboard");

    let store = state.store.clone();

    let raw = spawn_blocking(move || store.read_raw())
        .await
        .unwrap_or_else(|e| {
            error!("Snapshot read task failed: {e}");
            None
        });

    match raw {
        Some(bytes) => ([(CONTENT_TYPE, "application/json")], bytes).into_response(),
        None => Json(LeaderboardSnapshot::default()).into_response(),
    }
}
