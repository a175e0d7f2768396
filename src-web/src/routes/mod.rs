//! HTTP routes.

mod contacts;
mod dashboard;
mod export;
mod processing;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// `?q=<term>` on search and export routes.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/search", get(contacts::search))
        .route("/stats", get(contacts::stats))
        .route("/status", get(processing::status))
        .route("/start_processing", post(processing::start))
        .route("/stop_processing", post(processing::stop))
        .route("/process_once", post(processing::import_all))
        .route("/import_all", post(processing::import_all))
        .route("/export_excel", get(export::export_excel))
        .route("/export_excel_filtered", get(export::export_excel))
        .with_state(state)
}
