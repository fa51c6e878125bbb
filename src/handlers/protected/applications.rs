use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::{jobs::caller, EmailQuery};
use crate::app::AppState;
use crate::database::{parse_id, DeleteResult, InsertOneResult};
use crate::error::ApiResult;
use crate::filter::Filter;
use crate::middleware::AuthUser;
use crate::types::{Collection, Document};

/// GET /applied-jobs?email= - applications submitted by `email`
pub async fn applied_jobs(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = Filter::all().eq("applicantsData.applicantsEmail", query.email.as_str())?;
    let applications = state.store.find(Collection::Applications, &filter).await?;
    tracing::debug!("{} applications by {}", applications.len(), query.email);
    Ok(Json(applications))
}

/// POST /apply - record an application; the posting's counter is bumped separately
pub async fn apply(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(application): Json<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = state.store.insert_one(Collection::Applications, application).await?;
    tracing::debug!("Application {} submitted by {}", result.inserted_id, caller(&user));
    Ok(Json(result))
}

/// DELETE /undo/:id - withdraw an application
pub async fn undo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<AuthUser>>,
) -> ApiResult<Json<DeleteResult>> {
    let id = parse_id(&id)?;
    let result = state.store.delete_one(Collection::Applications, &Filter::by_id(id)).await?;
    tracing::debug!("Application {} withdrawn by {} ({})", id, caller(&user), result.deleted_count);
    Ok(Json(result))
}
