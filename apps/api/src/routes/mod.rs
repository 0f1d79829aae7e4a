pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::audit::handlers as audit_handlers;
use crate::hot_tags::handlers as hot_tag_handlers;
use crate::lists::handlers as list_handlers;
use crate::matching::handlers as match_handlers;
use crate::postings::handlers as posting_handlers;
use crate::state::AppState;
use crate::users::handlers as user_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Postings
        .route(
            "/api/v1/postings",
            post(posting_handlers::handle_submit).get(posting_handlers::handle_mine),
        )
        .route(
            "/api/v1/postings/:id",
            get(posting_handlers::handle_get)
                .put(posting_handlers::handle_update)
                .delete(posting_handlers::handle_delete),
        )
        .route(
            "/api/v1/postings/:id/renew",
            post(posting_handlers::handle_renew),
        )
        .route(
            "/api/v1/postings/:id/resubmit",
            post(posting_handlers::handle_resubmit),
        )
        .route(
            "/api/v1/postings/:id/match",
            post(posting_handlers::handle_match),
        )
        // Match records and connect actions
        .route("/api/v1/matches", get(match_handlers::handle_list_records))
        .route("/api/v1/matches/:id", get(match_handlers::handle_get_record))
        .route(
            "/api/v1/matches/:id/add-friend",
            post(match_handlers::handle_add_friend),
        )
        .route(
            "/api/v1/matches/:id/force-add",
            post(match_handlers::handle_force_add),
        )
        // Result projections
        .route("/api/v1/results", get(match_handlers::handle_list_results))
        .route(
            "/api/v1/results/:id/known",
            post(match_handlers::handle_mark_known),
        )
        .route(
            "/api/v1/results/:id/remark",
            put(match_handlers::handle_update_remark),
        )
        .route(
            "/api/v1/results/:id/notify",
            post(match_handlers::handle_notify),
        )
        // Match lists
        .route(
            "/api/v1/lists",
            post(list_handlers::handle_create).get(list_handlers::handle_list),
        )
        .route("/api/v1/lists/:id", delete(list_handlers::handle_deactivate))
        // Hot tags
        .route("/api/v1/hot-tags", get(hot_tag_handlers::handle_top))
        .route("/api/v1/hot-tags/click", post(hot_tag_handlers::handle_click))
        // Profile
        .route("/api/v1/me", get(user_handlers::handle_me))
        .route(
            "/api/v1/me/settings",
            put(user_handlers::handle_update_settings),
        )
        .route("/api/v1/me/ledger", get(user_handlers::handle_ledger))
        // Admin: audit queue and settings
        .route(
            "/api/v1/admin/postings/pending",
            get(audit_handlers::handle_pending),
        )
        .route(
            "/api/v1/admin/postings/:id/approve",
            post(audit_handlers::handle_approve),
        )
        .route(
            "/api/v1/admin/postings/:id/reject",
            post(audit_handlers::handle_reject),
        )
        .route(
            "/api/v1/admin/postings/approve-all",
            post(audit_handlers::handle_approve_all),
        )
        .route(
            "/api/v1/admin/audit-setting",
            get(audit_handlers::handle_get_setting).put(audit_handlers::handle_put_setting),
        )
        .route(
            "/api/v1/admin/hot-tags/:id/status",
            put(hot_tag_handlers::handle_set_status),
        )
        .with_state(state)
}
