//! Poller control and manual imports.

use axum::extract::State;
use axum::Json;
use intake::PollerStatus;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn start(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.poller.start();
    Json(json!({ "status": outcome.as_str() }))
}

pub async fn stop(State(state): State<AppState>) -> Json<Value> {
    state.poller.stop();
    Json(json!({ "status": "stopped" }))
}

pub async fn status(State(state): State<AppState>) -> Json<PollerStatus> {
    Json(state.poller.status())
}

/// Full-mailbox import; serves both `/process_once` and `/import_all`.
pub async fn import_all(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let summary = state.poller.run_once().await?;
    Ok(Json(json!({
        "status": "success",
        "processed": summary.processed,
        "total_found": summary.total_found,
    })))
}
