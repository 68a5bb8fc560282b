use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any account that passed the authentication layer: publishing
/// content, toggling likes and watchlist membership, commenting, profile
/// management, and media upload.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware layered
/// above this module, so each receives a validated identity (id, email,
/// role) for its ownership checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /upload/presigned
        // Media pipeline entry point: a short-lived presigned URL lets the
        // client push poster/avatar/blog-image bytes straight to the bucket.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // --- Profile ---
        // GET /me              — session profile
        // PUT /me              — partial profile update
        // GET /me/complete     — profile + blogs + reviews + watchlist
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .route("/me/complete", get(handlers::get_complete_profile))
        .route("/me/blogs", get(handlers::get_my_blogs))
        .route("/me/reviews", get(handlers::get_my_reviews))
        // PUT /me/watchlist/{movie_id}
        // Membership toggle: each call flips the movie in or out.
        .route("/me/watchlist/{movie_id}", put(handlers::toggle_watchlist))
        // --- Content publication (publishes immediately, no approval step) ---
        .route("/blogs", post(handlers::create_blog))
        .route("/reviews", post(handlers::create_review))
        // --- Like toggles ---
        // PUT because the operation is a state flip on an existing resource;
        // calling twice restores the original state.
        .route("/blogs/{id}/like", put(handlers::toggle_blog_like))
        .route("/reviews/{id}/like", put(handlers::toggle_review_like))
        // --- Commenting ---
        .route("/blogs/{id}/comments", post(handlers::add_blog_comment))
        .route("/reviews/{id}/comments", post(handlers::add_review_comment))
        // DELETE /comments/{id}
        // Owner delete; admins fall through to a force delete in the handler.
        .route("/comments/{id}", delete(handlers::delete_comment))
}
