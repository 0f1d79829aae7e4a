use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::lists::{self, CreateListRequest};
use crate::models::matching::MatchListRow;
use crate::models::{Pagination, UserIdQuery};
use crate::state::AppState;

/// POST /api/v1/lists
pub async fn handle_create(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<CreateListRequest>,
) -> Result<Json<MatchListRow>, AppError> {
    let list = lists::create(&state, params.user_id, &req).await?;
    Ok(Json(list))
}

/// GET /api/v1/lists
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MatchListRow>>, AppError> {
    let rows = lists::list(&state.db, params.user_id, &page).await?;
    Ok(Json(rows))
}

/// DELETE /api/v1/lists/:id
pub async fn handle_deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    lists::deactivate(&state.db, params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
