use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are unauthenticated and accessible to any client. All
/// content here is published-by-definition (blogs and reviews publish at
/// creation), so the read handlers have no hidden state to guard; the two
/// POST routes are the entry points of the access-request workflow.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Submits an access request. The account stays pending (and cannot
        // log in) until an admin approves it.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Exchanges credentials for a signed, time-limited session token.
        .route("/auth/login", post(handlers::login))
        // GET /movies, GET /movies/{id}
        // The admin-curated movie catalog.
        .route("/movies", get(handlers::get_movies))
        .route("/movies/{id}", get(handlers::get_movie_details))
        // GET /blogs?search=...&tag=...
        // Published blog posts with filtering.
        .route("/blogs", get(handlers::get_blogs))
        .route("/blogs/{id}", get(handlers::get_blog_details))
        .route("/blogs/{id}/comments", get(handlers::get_blog_comments))
        // GET /reviews?movie_id=...
        // Reviews, optionally scoped to one movie.
        .route("/reviews", get(handlers::get_reviews))
        .route("/reviews/{id}/comments", get(handlers::get_review_comments))
        // GET /search?q=...&kind=...
        // Cross-entity search over movies, blogs, and reviews.
        .route("/search", get(handlers::search))
        // GET /stats/users
        // Non-admin account count for the homepage counter.
        .route("/stats/users", get(handlers::get_user_count))
}
