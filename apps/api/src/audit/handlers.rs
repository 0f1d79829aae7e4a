use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::audit;
use crate::errors::AppError;
use crate::models::posting::PostingRow;
use crate::models::{Pagination, UserIdQuery};
use crate::state::AppState;

/// GET /api/v1/admin/postings/pending
pub async fn handle_pending(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PostingRow>>, AppError> {
    let postings = audit::pending(&state.db, &page).await?;
    Ok(Json(postings))
}

/// POST /api/v1/admin/postings/:id/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    audit::approve(&state.db, id, params.user_id).await?;
    Ok(Json(json!({ "approved": id })))
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// POST /api/v1/admin/postings/:id/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<Value>, AppError> {
    audit::reject(&state.db, id, params.user_id, &req.reason).await?;
    Ok(Json(json!({ "rejected": id })))
}

/// POST /api/v1/admin/postings/approve-all
///
/// Explicit drain of the pending queue, typically issued right after
/// disabling the audit requirement.
pub async fn handle_approve_all(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let drained = audit::approve_all_pending(&state.db, params.user_id).await?;
    Ok(Json(json!({ "approved_count": drained })))
}

#[derive(Serialize, Deserialize)]
pub struct AuditSetting {
    pub enabled: bool,
}

/// GET /api/v1/admin/audit-setting
pub async fn handle_get_setting(State(state): State<AppState>) -> Json<AuditSetting> {
    Json(AuditSetting {
        enabled: state.audit.is_enabled(),
    })
}

/// PUT /api/v1/admin/audit-setting
///
/// Only changes the default for postings submitted afterwards; already
/// pending postings stay pending until approved or drained.
pub async fn handle_put_setting(
    State(state): State<AppState>,
    Json(req): Json<AuditSetting>,
) -> Json<AuditSetting> {
    state.audit.set_enabled(req.enabled);
    Json(AuditSetting {
        enabled: state.audit.is_enabled(),
    })
}
