//! Connection-preference settings and the profile read the engine needs.
//! Identity and credentials live upstream; this module never touches them.

pub mod handlers;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::user::{UserContactRow, UserRow};

#[derive(Debug, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserRow,
    pub contact: Option<UserContactRow>,
}

pub async fn get_profile(pool: &PgPool, user_id: i64) -> Result<Profile, AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let user = user.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let contact: Option<UserContactRow> =
        sqlx::query_as("SELECT * FROM user_contacts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(Profile { user, contact })
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub location_visible: Option<bool>,
    pub allow_passive_add: Option<bool>,
    pub allow_force_add: Option<bool>,
}

pub async fn update_settings(
    pool: &PgPool,
    user_id: i64,
    req: &SettingsRequest,
) -> Result<UserRow, AppError> {
    let user: Option<UserRow> = sqlx::query_as(
        "UPDATE users
         SET location_visible = COALESCE($1, location_visible),
             allow_passive_add = COALESCE($2, allow_passive_add),
             allow_force_add = COALESCE($3, allow_force_add),
             updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(req.location_visible)
    .bind(req.allow_passive_add)
    .bind(req.allow_force_add)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}
