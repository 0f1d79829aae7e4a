use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::hot_tags::{self, TagWindow};
use crate::models::hot_tag::{HotTagRow, TagVisibility};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default = "default_n")]
    pub n: i64,
}

fn default_window() -> String {
    "24h".to_string()
}

fn default_n() -> i64 {
    10
}

/// GET /api/v1/hot-tags?window=24h&n=10
pub async fn handle_top(
    State(state): State<AppState>,
    Query(params): Query<TopQuery>,
) -> Result<Json<Vec<HotTagRow>>, AppError> {
    let window = TagWindow::parse(&params.window).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown window '{}', expected '24h' or 'total'",
            params.window
        ))
    })?;
    let tags = hot_tags::top(&state.db, params.n, window).await?;
    Ok(Json(tags))
}

#[derive(Deserialize)]
pub struct ClickRequest {
    pub keyword: String,
}

/// POST /api/v1/hot-tags/click
pub async fn handle_click(
    State(state): State<AppState>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<Value>, AppError> {
    hot_tags::click(&state.db, &req.keyword).await?;
    Ok(Json(json!({ "clicked": req.keyword })))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// PUT /api/v1/admin/hot-tags/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status = TagVisibility::parse(&req.status).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown status '{}', expected 'show', 'hide' or 'blackhole'",
            req.status
        ))
    })?;
    hot_tags::set_status(&state.db, id, status).await?;
    Ok(Json(json!({ "id": id, "status": req.status })))
}
