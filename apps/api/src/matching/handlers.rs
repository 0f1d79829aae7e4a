use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::matching::{self, connect, results};
use crate::models::matching::{MatchRecordRow, MatchResultRow};
use crate::models::{Pagination, UserIdQuery};
use crate::state::AppState;

/// GET /api/v1/matches
pub async fn handle_list_records(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MatchRecordRow>>, AppError> {
    let records = matching::records_for_user(&state.db, params.user_id, &page).await?;
    Ok(Json(records))
}

/// GET /api/v1/matches/:id
pub async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<MatchRecordRow>, AppError> {
    let record = matching::record_for_party(&state.db, params.user_id, id).await?;
    Ok(Json(record))
}

/// POST /api/v1/matches/:id/add-friend
pub async fn handle_add_friend(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    connect::add_friend(&state.db, params.user_id, id).await?;
    Ok(Json(json!({ "match_id": id, "status": "friend_added" })))
}

/// POST /api/v1/matches/:id/force-add
pub async fn handle_force_add(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    connect::force_add_friend(&state.db, state.config.force_add_cost, params.user_id, id).await?;
    Ok(Json(json!({
        "match_id": id,
        "status": "friend_added",
        "cost_coins": state.config.force_add_cost
    })))
}

/// GET /api/v1/results
pub async fn handle_list_results(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MatchResultRow>>, AppError> {
    let rows = results::list(&state.db, params.user_id, &page).await?;
    Ok(Json(rows))
}

/// POST /api/v1/results/:id/known
pub async fn handle_mark_known(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    results::mark_known(&state.db, params.user_id, id).await?;
    Ok(Json(json!({ "id": id, "is_known": true })))
}

#[derive(Deserialize)]
pub struct RemarkRequest {
    pub remark: String,
}

/// PUT /api/v1/results/:id/remark
pub async fn handle_update_remark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<RemarkRequest>,
) -> Result<Json<Value>, AppError> {
    results::update_remark(&state.db, params.user_id, id, &req.remark).await?;
    Ok(Json(json!({ "id": id, "remark": req.remark })))
}

/// POST /api/v1/results/:id/notify
pub async fn handle_notify(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<results::NotifyOutcome>, AppError> {
    let outcome = results::notify(&state, params.user_id, id).await?;
    Ok(Json(outcome))
}
