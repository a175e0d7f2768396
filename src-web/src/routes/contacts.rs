use axum::extract::{Query, State};
use axum::Json;
use intake::db::{contact_repo, stats_repo, ContactRecord, ContactStats};

use super::SearchParams;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<ContactRecord>>> {
    let records = contact_repo::query_contacts(&state.db, params.q.as_deref())?;
    Ok(Json(records))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ContactStats>> {
    Ok(Json(stats_repo::stats(&state.db)?))
}
