use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Admin Router Module
///
/// Routes exclusively for accounts with the 'admin' role: the access-request
/// approval queue, account and role management, catalog curation, content
/// moderation, and dashboards.
///
/// Access Control:
/// Every handler takes the `AuthUser` extractor (authentication) and calls
/// `AuthUser::require_admin()` (authorization) before touching the
/// repository, so a non-admin session can never reach moderation logic.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Access-request workflow ---
        // GET /admin/requests                   — pending queue
        // PATCH /admin/requests/{id}/approve    — approve (idempotent)
        // DELETE /admin/requests/{id}           — reject = delete, no tombstone
        .route("/requests", get(handlers::get_access_requests))
        .route("/requests/{id}/approve", patch(handlers::approve_request))
        .route("/requests/{id}", delete(handlers::reject_request))
        // --- Account management ---
        // The role flip and the delete both honor the protected-admin
        // exemption; POST creates another admin, approved immediately.
        .route(
            "/accounts",
            get(handlers::get_accounts).post(handlers::create_admin),
        )
        .route("/accounts/{id}/admin", put(handlers::toggle_admin_role))
        .route("/accounts/{id}", delete(handlers::delete_account))
        // --- Catalog curation ---
        .route("/movies", post(handlers::create_movie))
        .route(
            "/movies/{id}",
            put(handlers::update_movie).delete(handlers::delete_movie),
        )
        // --- Content moderation (moderation is deletion; content has no
        // pending state to approve) ---
        .route("/blogs/{id}", delete(handlers::delete_blog_admin))
        .route("/reviews/{id}", delete(handlers::delete_review_admin))
        .route("/comments", get(handlers::get_all_comments))
        // --- Dashboards ---
        .route("/stats", get(handlers::get_admin_stats))
        .route("/analytics", get(handlers::get_analytics))
}
