use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use intake::db::contact_repo;
use intake::export::{contacts_workbook, export_filename, normalize_search, XLSX_CONTENT_TYPE};

use super::SearchParams;
use crate::error::ApiResult;
use crate::state::AppState;

/// Streams the (optionally filtered) contact list as an `.xlsx` download.
pub async fn export_excel(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let search = normalize_search(params.q.as_deref());
    let records = contact_repo::query_contacts(&state.db, search)?;
    let bytes = contacts_workbook(&records, search, state.export.max_column_width)?;

    let filename = export_filename(search, Utc::now());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    log::info!("Exported {} contacts to {}", records.len(), filename);

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
