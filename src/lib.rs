use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the application by
/// aggregating every path and schema decorated with the `#[utoipa::path]`
/// and `#[derive(utoipa::ToSchema)]` macros. The resulting JSON is served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login,
        handlers::get_me, handlers::get_complete_profile, handlers::update_me,
        handlers::get_blogs, handlers::get_blog_details, handlers::get_my_blogs,
        handlers::create_blog, handlers::toggle_blog_like,
        handlers::get_reviews, handlers::get_my_reviews, handlers::create_review,
        handlers::toggle_review_like, handlers::toggle_watchlist,
        handlers::add_blog_comment, handlers::add_review_comment,
        handlers::get_blog_comments, handlers::get_review_comments,
        handlers::delete_comment,
        handlers::get_movies, handlers::get_movie_details, handlers::create_movie,
        handlers::update_movie, handlers::delete_movie,
        handlers::search, handlers::get_user_count, handlers::get_presigned_url,
        handlers::get_access_requests, handlers::approve_request, handlers::reject_request,
        handlers::get_accounts, handlers::toggle_admin_role, handlers::delete_account,
        handlers::create_admin,
        handlers::delete_blog_admin, handlers::delete_review_admin,
        handlers::get_all_comments,
        handlers::get_admin_stats, handlers::get_analytics
    ),
    components(
        schemas(
            models::AccountSummary, models::RegisterRequest, models::LoginRequest,
            models::CreateAdminRequest, models::AuthResponse, models::RegisterResponse,
            models::Movie, models::CreateMovieRequest, models::UpdateMovieRequest,
            models::Blog, models::CreateBlogRequest,
            models::Review, models::CreateReviewRequest,
            models::Comment, models::ModeratedComment, models::CreateCommentRequest,
            models::ContentKind, models::UpdateProfileRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::ToggleOutcome, models::AdminStats, models::AnalyticsReport,
            models::SearchResults, models::CompleteProfile, models::UserCount,
        )
    ),
    tags(
        (name = "cinelog", description = "Movie review & blogging platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access via the connection pool.
    pub repo: RepositoryState,
    /// Storage layer: abstracts bucket access and presigned URL generation.
    pub storage: StorageState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors selectively pull components from the shared
// AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated route group.
///
/// *Mechanism*: attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, a failed validation rejects the
/// request with 401 before the handler runs; on success the request simply
/// proceeds.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: protected by the `auth_middleware` layer.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: nested under '/admin'. Authentication runs through
        // the `AuthUser` extractor each handler takes; the 'admin' role check
        // happens inside the handlers.
        .nest("/admin", admin::admin_routes())
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: the whole request/response lifecycle
                // inside a span carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes span creation for `TraceLayer`: every log line for a request
/// is correlated by the `x-request-id` header alongside method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
