use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::matching;
use crate::models::posting::PostingRow;
use crate::models::{Pagination, UserIdQuery};
use crate::postings::{self, SubmitRequest, SubmitResponse};
use crate::state::AppState;

/// POST /api/v1/postings
pub async fn handle_submit(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let response = postings::submit(&state, params.user_id, &req).await?;
    Ok(Json(response))
}

/// GET /api/v1/postings
pub async fn handle_mine(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PostingRow>>, AppError> {
    let rows = postings::mine(&state.db, params.user_id, &page).await?;
    Ok(Json(rows))
}

/// GET /api/v1/postings/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PostingRow>, AppError> {
    let posting = postings::owned(&state.db, params.user_id, id).await?;
    Ok(Json(posting))
}

/// POST /api/v1/postings/:id/renew
pub async fn handle_renew(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PostingRow>, AppError> {
    let posting = postings::renew(&state, params.user_id, id).await?;
    Ok(Json(posting))
}

/// POST /api/v1/postings/:id/resubmit
pub async fn handle_resubmit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SubmitResponse>, AppError> {
    let response = postings::resubmit(&state, params.user_id, id).await?;
    Ok(Json(response))
}

/// PUT /api/v1/postings/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let response = postings::update(&state, params.user_id, id, &req).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/postings/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    postings::delete(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/postings/:id/match
///
/// Re-runs the matcher for one posting on demand; the same logic the
/// submission path and the full sweep use.
pub async fn handle_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let posting = postings::owned(&state.db, params.user_id, id).await?;
    let created =
        matching::match_for_posting(&state.db, state.config.connect_window_hours, &posting)
            .await?;
    Ok(Json(json!({ "posting_id": id, "match_count": created })))
}
