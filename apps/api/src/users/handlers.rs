use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::ledger;
use crate::models::ledger::LedgerEntryRow;
use crate::models::user::UserRow;
use crate::models::UserIdQuery;
use crate::state::AppState;
use crate::users::{self, Profile, SettingsRequest};

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Profile>, AppError> {
    let profile = users::get_profile(&state.db, params.user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/me/settings
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<UserRow>, AppError> {
    let user = users::update_settings(&state.db, params.user_id, &req).await?;
    Ok(Json(user))
}

#[derive(Serialize)]
pub struct LedgerResponse {
    pub balance: i64,
    pub entries: Vec<LedgerEntryRow>,
}

/// GET /api/v1/me/ledger
///
/// The balance next to its full append-only log; the entries sum to the
/// balance.
pub async fn handle_ledger(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<LedgerResponse>, AppError> {
    let balance = ledger::balance(&state.db, params.user_id).await?;
    let entries = ledger::entries(&state.db, params.user_id).await?;
    Ok(Json(LedgerResponse { balance, entries }))
}
