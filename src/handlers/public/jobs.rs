use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::parse_id;
use crate::error::ApiResult;
use crate::filter::Filter;
use crate::types::{Collection, Document};

/// GET /jobs - every posting, oldest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let jobs = state.store.find(Collection::Jobs, &Filter::all()).await?;
    tracing::debug!("Listing {} jobs", jobs.len());
    Ok(Json(jobs))
}

/// GET /job/:id and GET /get-job/:id - one posting, or `null` when absent
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Option<Document>>> {
    let id = parse_id(&id)?;
    let job = state.store.find_one(Collection::Jobs, &Filter::by_id(id)).await?;

    if job.is_none() {
        tracing::debug!("Job {} not found", id);
    }
    Ok(Json(job))
}
