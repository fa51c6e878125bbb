// handlers/protected/jobs.rs - Job posting writes and the poster's listing
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::EmailQuery;
use crate::app::AppState;
use crate::database::{parse_id, DeleteResult, InsertOneResult, Update, UpdateResult};
use crate::error::ApiResult;
use crate::filter::Filter;
use crate::middleware::AuthUser;
use crate::types::{Collection, Document};

/// GET /my-jobs?email= - postings whose `postedBy.email` matches
pub async fn my_jobs(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::all().eq("postedBy.email", query.email.as_str())?;
    let jobs = state.store.find(Collection::Jobs, &filter).await?;
    tracing::debug!("{} jobs posted by {}", jobs.len(), query.email);
    Ok(Json(jobs))
}

/// POST /add-job - insert the body as a new posting
pub async fn add(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(job): Json<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = state.store.insert_one(Collection::Jobs, job).await?;
    tracing::debug!("Job {} added by {}", result.inserted_id, caller(&user));
    Ok(Json(result))
}

/// PUT /update/:id - `$set` the body, creating the posting when the id is unknown
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<AuthUser>>,
    Json(fields): Json<Document>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .update_one(Collection::Jobs, &Filter::by_id(id), Update::set(fields), true)
        .await?;

    tracing::debug!(
        "Job {} updated by {} (matched {}, upserted {})",
        id,
        caller(&user),
        result.matched_count,
        result.upserted_count
    );
    Ok(Json(result))
}

/// PATCH /applicants/:id - bump the applicant counter by one
pub async fn increment_applicants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .update_one(Collection::Jobs, &Filter::by_id(id), Update::inc("applicants", 1), false)
        .await?;

    if result.matched_count == 0 {
        tracing::debug!("Applicant count not bumped: job {} not found", id);
    }
    Ok(Json(result))
}

/// DELETE /delete/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<Json<DeleteResult>> {
    let id = parse_id(&id)?;
    let result = state.store.delete_one(Collection::Jobs, &Filter::by_id(id)).await?;
    tracing::debug!("Job {} deleted by {} ({})", id, caller(&user), result.deleted_count);
    Ok(Json(result))
}

pub(super) fn caller(user: &Option<Extension<AuthUser>>) -> &str {
    user.as_ref().and_then(|Extension(u)| u.email()).unwrap_or("anonymous")
}
