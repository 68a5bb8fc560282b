use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        self, AccountSummary, AdminStats, AnalyticsReport, AuthResponse, Blog, Comment,
        CompleteProfile, ContentKind, CreateAdminRequest, CreateBlogRequest, CreateCommentRequest,
        CreateMovieRequest, CreateReviewRequest, LoginRequest, ModeratedComment, Movie,
        PresignedUrlRequest, PresignedUrlResponse, RegisterRequest, RegisterResponse, Review,
        ROLE_ADMIN, ROLE_USER, ToggleOutcome, UpdateMovieRequest, UpdateProfileRequest, UserCount,
    },
    repository::{NewAccount, RelationKind},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

// --- Filter Structs ---

/// Accepted query parameters for the public blog listing (GET /blogs).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct BlogFilter {
    /// Optional case-insensitive search over title and content.
    pub search: Option<String>,
    /// Optional exact tag match.
    pub tag: Option<String>,
}

/// Accepted query parameters for the review listing (GET /reviews).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReviewFilter {
    /// Restrict the listing to one movie.
    pub movie_id: Option<Uuid>,
}

/// Accepted query parameters for cross-entity search (GET /search).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Restricts the result sections: "movies", "blogs", or "reviews".
    pub kind: Option<String>,
}

/// Accepted query parameters for the analytics dashboard.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AnalyticsParams {
    /// One of "7d", "30d", "90d", "1y", "all". Defaults to "all".
    pub time_range: Option<String>,
}

// --- Access request / session handlers ---

/// register
///
/// [Public Route] Submits an access request. The account lands in the
/// pending state with a salted argon2 hash; no session token is issued
/// until an admin approves the request. Deployments running with
/// `auto_approve_accounts` skip the queue and get a token straight away.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Request submitted", body = RegisterResponse),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = payload.username.trim();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username, email and password are required".to_string(),
        ));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let account = state
        .repo
        .create_account(NewAccount {
            username: username.to_string(),
            email,
            password_hash,
            role: ROLE_USER.to_string(),
            approved: state.config.auto_approve_accounts,
        })
        .await?;

    let token = if state.config.auto_approve_accounts {
        Some(auth::issue_token(&state.config, &account)?)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: account.into(),
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Authenticates an account and issues a signed, time-limited
/// session token. Unknown emails and wrong passwords are indistinguishable;
/// pending accounts are rejected with `not_approved` until an admin acts
/// (admins are exempt from the approval gate).
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = AuthResponse),
        (status = 400, description = "Invalid credentials"),
        (status = 403, description = "Not approved yet")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let account = state
        .repo
        .get_account_by_email(payload.email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&account.password_hash, &payload.password) {
        return Err(ApiError::InvalidCredentials);
    }

    if !account.approved && !account.is_admin() {
        return Err(ApiError::NotApproved);
    }

    let token = auth::issue_token(&state.config, &account)?;
    Ok(Json(AuthResponse {
        token,
        account: account.into(),
    }))
}

// --- Profile handlers ---

/// get_me
///
/// [Authenticated Route] The caller's own profile, hash excluded.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = AccountSummary))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AccountSummary>, ApiError> {
    let account = state
        .repo
        .get_account(id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;
    Ok(Json(account.into()))
}

/// get_complete_profile
///
/// [Authenticated Route] Aggregated profile view: the account plus its
/// blogs, reviews, and resolved watchlist in one response.
#[utoipa::path(
    get,
    path = "/me/complete",
    responses((status = 200, description = "Aggregated profile", body = CompleteProfile))
)]
pub async fn get_complete_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CompleteProfile>, ApiError> {
    let account = state
        .repo
        .get_account(id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;

    let blogs = state.repo.get_blogs_by_author(id).await?;
    let reviews = state.repo.get_reviews_by_author(id).await?;
    let watchlist = state.repo.get_watchlist(id).await?;

    Ok(Json(CompleteProfile {
        account: account.into(),
        blogs,
        reviews,
        watchlist,
    }))
}

/// update_me
///
/// [Authenticated Route] Partial profile update; only the provided fields
/// change. The avatar is an object key from the presigned upload flow.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = AccountSummary))
)]
pub async fn update_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AccountSummary>, ApiError> {
    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(ApiError::BadRequest("Username cannot be blank".to_string()));
        }
    }

    let account = state
        .repo
        .update_profile(id, payload)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;
    Ok(Json(account.into()))
}

// --- Blog handlers ---

/// get_blogs
///
/// [Public Route] Lists published blogs with optional search and tag
/// filters. All blogs are published; there is no hidden state to leak.
#[utoipa::path(
    get,
    path = "/blogs",
    params(BlogFilter),
    responses((status = 200, description = "Published blogs", body = [Blog]))
)]
pub async fn get_blogs(
    State(state): State<AppState>,
    Query(filter): Query<BlogFilter>,
) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = state.repo.list_blogs(filter.search, filter.tag).await?;
    Ok(Json(blogs))
}

/// get_blog_details
///
/// [Public Route] One blog by id, enriched with author and like count.
#[utoipa::path(
    get,
    path = "/blogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses((status = 200, description = "Found", body = Blog))
)]
pub async fn get_blog_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, ApiError> {
    let blog = state
        .repo
        .get_blog(id)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
    Ok(Json(blog))
}

/// get_my_blogs
///
/// [Authenticated Route] Lists the caller's own blog posts.
#[utoipa::path(
    get,
    path = "/me/blogs",
    responses((status = 200, description = "My blogs", body = [Blog]))
)]
pub async fn get_my_blogs(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = state.repo.get_blogs_by_author(id).await?;
    Ok(Json(blogs))
}

/// create_blog
///
/// [Authenticated Route] Publishes a blog post. Publication happens at
/// creation time; there is no separate approval step for content.
#[utoipa::path(
    post,
    path = "/blogs",
    request_body = CreateBlogRequest,
    responses((status = 201, description = "Published", body = Blog))
)]
pub async fn create_blog(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and content are required".to_string(),
        ));
    }

    let blog = state.repo.create_blog(id, payload).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// toggle_blog_like
///
/// [Authenticated Route] Flips the caller's like on a blog. Every call
/// toggles: like, then unlike, then like again. The flip is a single atomic
/// statement in the store.
#[utoipa::path(
    put,
    path = "/blogs/{id}/like",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "New like state", body = ToggleOutcome),
        (status = 404, description = "No such blog")
    )
)]
pub async fn toggle_blog_like(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(blog_id): Path<Uuid>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let outcome = state
        .repo
        .toggle_relation(RelationKind::for_content(ContentKind::Blog), blog_id, user_id)
        .await?;
    Ok(Json(outcome))
}

// --- Review handlers ---

/// get_reviews
///
/// [Public Route] Lists reviews, optionally restricted to one movie.
#[utoipa::path(
    get,
    path = "/reviews",
    params(ReviewFilter),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.repo.list_reviews(filter.movie_id).await?;
    Ok(Json(reviews))
}

/// get_my_reviews
///
/// [Authenticated Route] Lists the caller's own reviews.
#[utoipa::path(
    get,
    path = "/me/reviews",
    responses((status = 200, description = "My reviews", body = [Review]))
)]
pub async fn get_my_reviews(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.repo.get_reviews_by_author(id).await?;
    Ok(Json(reviews))
}

/// create_review
///
/// [Authenticated Route] Publishes a review for a catalog movie. The rating
/// must sit in 1..=10, the movie must exist (its title is snapshotted from
/// the catalog), and each account gets one review per movie.
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Published", body = Review),
        (status = 404, description = "No such movie"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn create_review(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if !(1..=10).contains(&payload.rating) {
        return Err(ApiError::BadRequest(
            "Rating must be between 1 and 10".to_string(),
        ));
    }
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Review content is required".to_string()));
    }

    let movie = state
        .repo
        .get_movie(payload.movie_id)
        .await?
        .ok_or(ApiError::NotFound("Movie"))?;

    let review = state
        .repo
        .create_review(id, movie.id, &movie.title, payload.rating, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// toggle_review_like
///
/// [Authenticated Route] Flips the caller's like on a review. Same toggle
/// contract as blogs.
#[utoipa::path(
    put,
    path = "/reviews/{id}/like",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "New like state", body = ToggleOutcome),
        (status = 404, description = "No such review")
    )
)]
pub async fn toggle_review_like(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let outcome = state
        .repo
        .toggle_relation(
            RelationKind::for_content(ContentKind::Review),
            review_id,
            user_id,
        )
        .await?;
    Ok(Json(outcome))
}

// --- Watchlist ---

/// toggle_watchlist
///
/// [Authenticated Route] Flips a movie in and out of the caller's
/// watchlist. The relation has no attributes; the pair's presence is the
/// whole state.
#[utoipa::path(
    put,
    path = "/me/watchlist/{movie_id}",
    params(("movie_id" = Uuid, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "New membership state", body = ToggleOutcome),
        (status = 404, description = "No such movie")
    )
)]
pub async fn toggle_watchlist(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let outcome = state
        .repo
        .toggle_relation(RelationKind::Watchlist, movie_id, id)
        .await?;
    Ok(Json(outcome))
}

// --- Comment handlers ---

/// add_blog_comment
///
/// [Authenticated Route] Appends a comment to a blog. Comments are never
/// edited afterwards, only deleted.
#[utoipa::path(
    post,
    path = "/blogs/{id}/comments",
    request_body = CreateCommentRequest,
    responses((status = 201, description = "Comment added", body = Comment))
)]
pub async fn add_blog_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(blog_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    add_comment_inner(state, ContentKind::Blog, blog_id, user_id, payload).await
}

/// add_review_comment
///
/// [Authenticated Route] Appends a comment to a review.
#[utoipa::path(
    post,
    path = "/reviews/{id}/comments",
    request_body = CreateCommentRequest,
    responses((status = 201, description = "Comment added", body = Comment))
)]
pub async fn add_review_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    add_comment_inner(state, ContentKind::Review, review_id, user_id, payload).await
}

/// Shared comment-creation path: validates the body, checks the parent
/// exists, then inserts.
async fn add_comment_inner(
    state: AppState,
    kind: ContentKind,
    parent_id: Uuid,
    user_id: Uuid,
    payload: CreateCommentRequest,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment text is required".to_string()));
    }

    ensure_content_exists(&state, kind, parent_id).await?;

    let comment = state
        .repo
        .add_comment(kind, parent_id, user_id, payload.text.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// get_blog_comments
///
/// [Public Route] All comments on a blog, oldest first.
#[utoipa::path(
    get,
    path = "/blogs/{id}/comments",
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_blog_comments(
    State(state): State<AppState>,
    Path(blog_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    ensure_content_exists(&state, ContentKind::Blog, blog_id).await?;
    let comments = state.repo.get_comments(ContentKind::Blog, blog_id).await?;
    Ok(Json(comments))
}

/// get_review_comments
///
/// [Public Route] All comments on a review, oldest first.
#[utoipa::path(
    get,
    path = "/reviews/{id}/comments",
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_review_comments(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    ensure_content_exists(&state, ContentKind::Review, review_id).await?;
    let comments = state
        .repo
        .get_comments(ContentKind::Review, review_id)
        .await?;
    Ok(Json(comments))
}

async fn ensure_content_exists(
    state: &AppState,
    kind: ContentKind,
    id: Uuid,
) -> Result<(), ApiError> {
    let exists = match kind {
        ContentKind::Blog => state.repo.get_blog(id).await?.is_some(),
        ContentKind::Review => state.repo.get_review(id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(match kind {
            ContentKind::Blog => ApiError::NotFound("Blog"),
            ContentKind::Review => ApiError::NotFound("Review"),
        })
    }
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment with two tiers of authorization:
/// admins delete any comment, everyone else only their own. A comment that
/// exists but belongs to someone else simply isn't matched, so the caller
/// sees the same `not_found` as for an absent id.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn delete_comment(
    AuthUser {
        id: user_id, role, ..
    }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = if role == ROLE_ADMIN {
        state.repo.delete_comment_admin(id).await?
    } else {
        state.repo.delete_comment(id, user_id).await?
    };

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Comment"))
    }
}

// --- Movie catalog handlers ---

/// get_movies
///
/// [Public Route] The whole catalog, newest first.
#[utoipa::path(
    get,
    path = "/movies",
    responses((status = 200, description = "Catalog", body = [Movie]))
)]
pub async fn get_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.repo.list_movies().await?;
    Ok(Json(movies))
}

/// get_movie_details
///
/// [Public Route] One catalog entry by id.
#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = Uuid, Path, description = "Movie ID")),
    responses((status = 200, description = "Found", body = Movie))
)]
pub async fn get_movie_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Movie>, ApiError> {
    let movie = state
        .repo
        .get_movie(id)
        .await?
        .ok_or(ApiError::NotFound("Movie"))?;
    Ok(Json(movie))
}

/// create_movie
///
/// [Admin Route] Adds a catalog entry. Genre and cast lists tolerate both
/// array and comma-joined input; the poster is an object key from the
/// presigned upload flow or an external URL.
#[utoipa::path(
    post,
    path = "/admin/movies",
    request_body = CreateMovieRequest,
    responses((status = 201, description = "Created", body = Movie))
)]
pub async fn create_movie(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMovieRequest>,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    auth.require_admin()?;

    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.director.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Title, description and director are required".to_string(),
        ));
    }
    if let Some(rating) = payload.average_rating {
        if !(0.0..=10.0).contains(&rating) {
            return Err(ApiError::BadRequest(
                "Average rating must be between 0 and 10".to_string(),
            ));
        }
    }

    let movie = state.repo.create_movie(payload).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// update_movie
///
/// [Admin Route] Partial update of a catalog entry.
#[utoipa::path(
    put,
    path = "/admin/movies/{id}",
    request_body = UpdateMovieRequest,
    responses((status = 200, description = "Updated", body = Movie))
)]
pub async fn update_movie(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMovieRequest>,
) -> Result<Json<Movie>, ApiError> {
    auth.require_admin()?;

    let movie = state
        .repo
        .update_movie(id, payload)
        .await?
        .ok_or(ApiError::NotFound("Movie"))?;
    Ok(Json(movie))
}

/// delete_movie
///
/// [Admin Route] Removes a catalog entry. Reviews and watchlist entries
/// referencing it cascade away in the store.
#[utoipa::path(
    delete,
    path = "/admin/movies/{id}",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_movie(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;

    if state.repo.delete_movie(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Movie"))
    }
}

// --- Search ---

/// search
///
/// [Public Route] Case-insensitive search across movies, blogs, and
/// reviews. `kind` narrows the result to one section.
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses((status = 200, description = "Search results", body = models::SearchResults))
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<models::SearchResults>, ApiError> {
    let q = params.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(ApiError::BadRequest("Search query required".to_string()));
    }

    let kind = params.kind.as_deref();
    let mut results = models::SearchResults::default();

    if kind.is_none() || kind == Some("movies") {
        results.movies = Some(state.repo.search_movies(q).await?);
    }
    if kind.is_none() || kind == Some("blogs") {
        results.blogs = Some(state.repo.search_blogs(q).await?);
    }
    if kind.is_none() || kind == Some("reviews") {
        results.reviews = Some(state.repo.search_reviews(q).await?);
    }

    Ok(Json(results))
}

// --- Public stats ---

/// get_user_count
///
/// [Public Route] Non-admin account count for the homepage counter.
#[utoipa::path(
    get,
    path = "/stats/users",
    responses((status = 200, description = "User count", body = UserCount))
)]
pub async fn get_user_count(State(state): State<AppState>) -> Result<Json<UserCount>, ApiError> {
    let user_count = state.repo.count_regular_users().await?;
    Ok(Json(UserCount { user_count }))
}

// --- Media upload ---

/// get_presigned_url
///
/// [Authenticated Route] Generates a temporary, secure URL for direct
/// client-to-bucket upload. The URL is short-lived, constrained to the
/// declared `file_type`, and keyed by a fresh UUID, so heavy media bytes
/// never pass through the application server.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    AuthUser { id: _user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    // Unique, structured object key ('uploads/UUID.ext').
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let unique_id = Uuid::new_v4();
    let object_key = format!("uploads/{}.{}", unique_id, extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => Ok(Json(PresignedUrlResponse {
            upload_url: url,
            resource_key: object_key,
        })),
        Err(e) => {
            // Log the underlying storage error but return a generic failure.
            tracing::error!("storage error: {}", e);
            Err(ApiError::Internal)
        }
    }
}

// --- Admin: approval workflow ---

/// get_access_requests
///
/// [Admin Route] Accounts waiting in the pending state, oldest first.
#[utoipa::path(
    get,
    path = "/admin/requests",
    responses((status = 200, description = "Pending requests", body = [AccountSummary]))
)]
pub async fn get_access_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    auth.require_admin()?;
    let pending = state.repo.list_pending_accounts().await?;
    Ok(Json(pending))
}

/// approve_request
///
/// [Admin Route] Approves a pending access request, after which the account
/// can authenticate. Approving an already-approved account is a no-op
/// success returning the same terminal state.
#[utoipa::path(
    patch,
    path = "/admin/requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Approved", body = AccountSummary),
        (status = 404, description = "No such account")
    )
)]
pub async fn approve_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountSummary>, ApiError> {
    auth.require_admin()?;
    let account = state
        .repo
        .approve_account(id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;
    Ok(Json(account.into()))
}

/// reject_request
///
/// [Admin Route] Rejects a pending access request by deleting the account
/// outright; there is no tombstone. Requests already processed by either
/// path (approved earlier, or rejected twice) come back `not_found`.
#[utoipa::path(
    delete,
    path = "/admin/requests/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Rejected and removed"),
        (status = 404, description = "Already processed or unknown")
    )
)]
pub async fn reject_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    if state.repo.reject_account(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Account"))
    }
}

// --- Admin: account management ---

/// get_accounts
///
/// [Admin Route] Every account in the system, hashes excluded.
#[utoipa::path(
    get,
    path = "/admin/accounts",
    responses((status = 200, description = "All accounts", body = [AccountSummary]))
)]
pub async fn get_accounts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    auth.require_admin()?;
    let accounts = state.repo.list_accounts().await?;
    Ok(Json(accounts))
}

/// toggle_admin_role
///
/// [Admin Route] Flips an account between the user and admin roles. The
/// protected admin is exempt: any flip that would strip its admin bit fails
/// with `forbidden` no matter who calls, and the store-level mutation
/// carries the same guard.
#[utoipa::path(
    put,
    path = "/admin/accounts/{id}/admin",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Role flipped", body = AccountSummary),
        (status = 403, description = "Protected admin"),
        (status = 404, description = "No such account")
    )
)]
pub async fn toggle_admin_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountSummary>, ApiError> {
    auth.require_admin()?;

    let target = state
        .repo
        .get_account(id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;

    if state.config.is_protected_admin(&target.email) {
        return Err(ApiError::Forbidden(
            "Cannot remove admin rights from the protected administrator".to_string(),
        ));
    }

    let account = state
        .repo
        .toggle_admin_role(id, &state.config.protected_admin_email)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;
    Ok(Json(account.into()))
}

/// delete_account
///
/// [Admin Route] Removes an account; its content and relations cascade in
/// the store. The protected admin cannot be deleted by anyone.
#[utoipa::path(
    delete,
    path = "/admin/accounts/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Protected admin"),
        (status = 404, description = "No such account")
    )
)]
pub async fn delete_account(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;

    let target = state
        .repo
        .get_account(id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;

    if state.config.is_protected_admin(&target.email) {
        return Err(ApiError::Forbidden(
            "The protected administrator cannot be deleted".to_string(),
        ));
    }

    if state
        .repo
        .delete_account(id, &state.config.protected_admin_email)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Account"))
    }
}

/// create_admin
///
/// [Admin Route] Creates another administrator. Admin-created accounts skip
/// the approval queue entirely.
#[utoipa::path(
    post,
    path = "/admin/accounts",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = AccountSummary),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn create_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    auth.require_admin()?;

    let username = payload.username.trim();
    let email = payload.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username, email and password are required".to_string(),
        ));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let account = state
        .repo
        .create_account(NewAccount {
            username: username.to_string(),
            email,
            password_hash,
            role: ROLE_ADMIN.to_string(),
            approved: true,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

// --- Admin: content moderation ---

/// delete_blog_admin
///
/// [Admin Route] Content moderation is deletion: removes any blog and its
/// comments.
#[utoipa::path(
    delete,
    path = "/admin/blogs/{id}",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_blog_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;

    if state.repo.delete_blog(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Blog"))
    }
}

/// delete_review_admin
///
/// [Admin Route] Removes any review and its comments.
#[utoipa::path(
    delete,
    path = "/admin/reviews/{id}",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_review_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;

    if state.repo.delete_review(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Review"))
    }
}

/// get_all_comments
///
/// [Admin Route] Flat moderation feed over every comment in the system,
/// regardless of parent kind, newest first.
#[utoipa::path(
    get,
    path = "/admin/comments",
    responses((status = 200, description = "All comments", body = [ModeratedComment]))
)]
pub async fn get_all_comments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ModeratedComment>>, ApiError> {
    auth.require_admin()?;
    let comments = state.repo.list_all_comments().await?;
    Ok(Json(comments))
}

// --- Admin: dashboards ---

/// get_admin_stats
///
/// [Admin Route] Core counters for the moderation dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.get_stats().await?))
}

/// get_analytics
///
/// [Admin Route] Dashboard analytics over an optional time window.
#[utoipa::path(
    get,
    path = "/admin/analytics",
    params(AnalyticsParams),
    responses((status = 200, description = "Analytics", body = AnalyticsReport))
)]
pub async fn get_analytics(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    auth.require_admin()?;

    let window_days = match params.time_range.as_deref() {
        None | Some("all") => None,
        Some("7d") => Some(7),
        Some("30d") => Some(30),
        Some("90d") => Some(90),
        Some("1y") => Some(365),
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown time range '{other}'"
            )));
        }
    };

    Ok(Json(state.repo.get_analytics(window_days).await?))
}
