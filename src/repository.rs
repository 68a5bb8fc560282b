use crate::error::{ApiError, is_foreign_key_violation, is_unique_violation};
use crate::models::{
    Account, AccountSummary, AdminStats, AnalyticsReport, Blog, Comment, ContentKind,
    CreateBlogRequest, CreateMovieRequest, ModeratedComment, Movie, Review, ROLE_ADMIN, ROLE_USER,
    ToggleOutcome, UpdateMovieRequest, UpdateProfileRequest,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// NewAccount
///
/// Internal insertion shape for the `accounts` table. The password arrives
/// here already hashed; the repository never sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub approved: bool,
}

/// RelationKind
///
/// Names the three pure membership relations. Every relation is a
/// (object, subject) pair whose presence is the entire state, so one toggle
/// implementation serves all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BlogLike,
    ReviewLike,
    Watchlist,
}

impl RelationKind {
    pub fn for_content(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Blog => RelationKind::BlogLike,
            ContentKind::Review => RelationKind::ReviewLike,
        }
    }

    fn table(&self) -> &'static str {
        match self {
            RelationKind::BlogLike => "blog_likes",
            RelationKind::ReviewLike => "review_likes",
            RelationKind::Watchlist => "watchlist_entries",
        }
    }

    fn object_col(&self) -> &'static str {
        match self {
            RelationKind::BlogLike | RelationKind::ReviewLike => "content_id",
            RelationKind::Watchlist => "movie_id",
        }
    }
}

/// Repository Trait
///
/// The abstract contract for all persistence operations, letting handlers
/// interact with the data layer without knowing the concrete implementation
/// (Postgres in production, in-memory mocks in tests).
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts & approval workflow ---
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, ApiError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, ApiError>;
    /// Inserts a new account; duplicate email or username maps to `Conflict`.
    async fn create_account(&self, new: NewAccount) -> Result<Account, ApiError>;
    /// All accounts, newest first. Hashes stay behind the projection.
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, ApiError>;
    /// Accounts still in the pending state (non-admin).
    async fn list_pending_accounts(&self) -> Result<Vec<AccountSummary>, ApiError>;
    /// Flips `approved` to true. Idempotent: re-approving an approved account
    /// returns it unchanged. None when the account does not exist.
    async fn approve_account(&self, id: Uuid) -> Result<Option<Account>, ApiError>;
    /// Deletes a still-pending, non-admin account. False when the request was
    /// already processed by either path (or never existed).
    async fn reject_account(&self, id: Uuid) -> Result<bool, ApiError>;
    /// Deletes any account except the protected admin, whose email is passed
    /// in as the guard.
    async fn delete_account(&self, id: Uuid, protected_email: &str) -> Result<bool, ApiError>;
    /// Atomically flips the admin role. The protected admin is excluded at
    /// the statement level; None when no row matched.
    async fn toggle_admin_role(
        &self,
        id: Uuid,
        protected_email: &str,
    ) -> Result<Option<Account>, ApiError>;
    /// Partial profile update with COALESCE semantics.
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Account>, ApiError>;
    /// Upserts the protected admin: creates it approved + admin when absent,
    /// re-asserts the role and approval when present.
    async fn ensure_protected_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, ApiError>;
    async fn count_regular_users(&self) -> Result<i64, ApiError>;

    // --- Movie catalog ---
    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError>;
    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, ApiError>;
    async fn create_movie(&self, req: CreateMovieRequest) -> Result<Movie, ApiError>;
    async fn update_movie(
        &self,
        id: Uuid,
        req: UpdateMovieRequest,
    ) -> Result<Option<Movie>, ApiError>;
    async fn delete_movie(&self, id: Uuid) -> Result<bool, ApiError>;
    /// The movies an account has saved, newest catalog entries first.
    async fn get_watchlist(&self, account_id: Uuid) -> Result<Vec<Movie>, ApiError>;

    // --- Blogs ---
    /// Published blogs, newest first, with optional search/tag filters.
    async fn list_blogs(
        &self,
        search: Option<String>,
        tag: Option<String>,
    ) -> Result<Vec<Blog>, ApiError>;
    async fn get_blog(&self, id: Uuid) -> Result<Option<Blog>, ApiError>;
    async fn get_blogs_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>, ApiError>;
    async fn create_blog(
        &self,
        author_id: Uuid,
        req: CreateBlogRequest,
    ) -> Result<Blog, ApiError>;
    /// Admin moderation: removes the blog and its comments transactionally.
    async fn delete_blog(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Reviews ---
    async fn list_reviews(&self, movie_id: Option<Uuid>) -> Result<Vec<Review>, ApiError>;
    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, ApiError>;
    async fn get_reviews_by_author(&self, author_id: Uuid) -> Result<Vec<Review>, ApiError>;
    /// One review per account per movie; duplicates map to `Conflict`.
    async fn create_review(
        &self,
        author_id: Uuid,
        movie_id: Uuid,
        movie_title: &str,
        rating: i32,
        content: &str,
    ) -> Result<Review, ApiError>;
    async fn delete_review(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Comments ---
    async fn add_comment(
        &self,
        kind: ContentKind,
        parent_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, ApiError>;
    async fn get_comments(
        &self,
        kind: ContentKind,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>, ApiError>;
    /// Owner delete: only matches rows authored by `author_id`.
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> Result<bool, ApiError>;
    /// Admin override: deletes any comment by id.
    async fn delete_comment_admin(&self, id: i64) -> Result<bool, ApiError>;
    /// Flat moderation feed across both parent kinds, newest first.
    async fn list_all_comments(&self) -> Result<Vec<ModeratedComment>, ApiError>;

    // --- Membership toggles ---
    /// Atomically flips (object, subject) membership in the named relation
    /// and reports the resulting state and membership count for the object.
    /// A dangling object id maps to `NotFound`.
    async fn toggle_relation(
        &self,
        kind: RelationKind,
        object_id: Uuid,
        subject_id: Uuid,
    ) -> Result<ToggleOutcome, ApiError>;

    // --- Dashboards & search ---
    async fn get_stats(&self) -> Result<AdminStats, ApiError>;
    /// `window_days` of None means all-time for the windowed counters.
    async fn get_analytics(&self, window_days: Option<i64>) -> Result<AnalyticsReport, ApiError>;
    async fn search_movies(&self, q: &str) -> Result<Vec<Movie>, ApiError>;
    async fn search_blogs(&self, q: &str) -> Result<Vec<Blog>, ApiError>;
    async fn search_reviews(&self, q: &str) -> Result<Vec<Review>, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLS: &str =
    "id, username, email, password_hash, avatar, bio, role, approved, created_at";

const ACCOUNT_SUMMARY_COLS: &str = "id, username, email, avatar, bio, role, approved, created_at";

// Shared SELECT fragments. Blogs and reviews always come back enriched with
// the author join and a correlated like count.
const BLOG_SELECT: &str = r#"
    SELECT b.id, b.author_id, b.title, b.content, b.image, b.tags, b.created_at,
           a.username AS author_username, a.avatar AS author_avatar,
           (SELECT COUNT(*) FROM blog_likes l WHERE l.content_id = b.id) AS like_count
    FROM blogs b
    JOIN accounts a ON b.author_id = a.id
"#;

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.movie_id, r.movie_title, r.author_id, r.rating, r.content, r.created_at,
           a.username AS author_username, a.avatar AS author_avatar,
           (SELECT COUNT(*) FROM review_likes l WHERE l.content_id = r.id) AS like_count
    FROM reviews r
    JOIN accounts a ON r.author_id = a.id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    // --- Accounts & approval workflow ---

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, ApiError> {
        let result = sqlx::query_as::<_, Account>(&format!(
            r#"INSERT INTO accounts (id, username, email, password_hash, role, approved, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW())
               RETURNING {ACCOUNT_COLS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(new.email.to_lowercase())
        .bind(&new.password_hash)
        .bind(&new.role)
        .bind(new.approved)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(account) => Ok(account),
            Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
                "An account with this email or username already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, ApiError> {
        let accounts = sqlx::query_as::<_, AccountSummary>(&format!(
            "SELECT {ACCOUNT_SUMMARY_COLS} FROM accounts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn list_pending_accounts(&self) -> Result<Vec<AccountSummary>, ApiError> {
        let accounts = sqlx::query_as::<_, AccountSummary>(&format!(
            r#"SELECT {ACCOUNT_SUMMARY_COLS} FROM accounts
               WHERE approved = false AND role <> $1
               ORDER BY created_at ASC"#
        ))
        .bind(ROLE_ADMIN)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn approve_account(&self, id: Uuid) -> Result<Option<Account>, ApiError> {
        // Matches already-approved rows too, so re-approval is a no-op success.
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET approved = true WHERE id = $1 RETURNING {ACCOUNT_COLS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn reject_account(&self, id: Uuid) -> Result<bool, ApiError> {
        // Rejection only applies to requests still in the pending state;
        // approved or admin accounts no longer match.
        let result =
            sqlx::query("DELETE FROM accounts WHERE id = $1 AND approved = false AND role <> $2")
                .bind(id)
                .bind(ROLE_ADMIN)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, id: Uuid, protected_email: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND email <> $2")
            .bind(id)
            .bind(protected_email.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_admin_role(
        &self,
        id: Uuid,
        protected_email: &str,
    ) -> Result<Option<Account>, ApiError> {
        // Single-statement role flip; the guard keeps the protected admin out
        // of the match set no matter who calls.
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"UPDATE accounts
               SET role = CASE WHEN role = $3 THEN $4 ELSE $3 END
               WHERE id = $1 AND email <> $2
               RETURNING {ACCOUNT_COLS}"#
        ))
        .bind(id)
        .bind(protected_email.to_lowercase())
        .bind(ROLE_ADMIN)
        .bind(ROLE_USER)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Account>, ApiError> {
        let result = sqlx::query_as::<_, Account>(&format!(
            r#"UPDATE accounts
               SET username = COALESCE($2, username),
                   bio = COALESCE($3, bio),
                   avatar = COALESCE($4, avatar)
               WHERE id = $1
               RETURNING {ACCOUNT_COLS}"#
        ))
        .bind(id)
        .bind(req.username)
        .bind(req.bio)
        .bind(req.avatar_key)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(account) => Ok(account),
            Err(e) if is_unique_violation(&e) => {
                Err(ApiError::Conflict("Username already taken".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_protected_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, ApiError> {
        // Re-asserts role and approval on every boot; the stored password
        // hash is left alone once the account exists.
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"INSERT INTO accounts (id, username, email, password_hash, role, approved, created_at)
               VALUES ($1, $2, $3, $4, $5, true, NOW())
               ON CONFLICT (email) DO UPDATE SET role = $5, approved = true
               RETURNING {ACCOUNT_COLS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(ROLE_ADMIN)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    async fn count_regular_users(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role <> $1")
            .bind(ROLE_ADMIN)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // --- Movie catalog ---

    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, ApiError> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn create_movie(&self, req: CreateMovieRequest) -> Result<Movie, ApiError> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"INSERT INTO movies
                   (id, title, description, year, genres, director, cast_members,
                    poster_url, trailer_url, average_rating, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.year)
        .bind(&req.genres)
        .bind(&req.director)
        .bind(&req.cast_members)
        .bind(req.poster_url.unwrap_or_default())
        .bind(req.trailer_url.unwrap_or_default())
        .bind(req.average_rating.unwrap_or(0.0))
        .fetch_one(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn update_movie(
        &self,
        id: Uuid,
        req: UpdateMovieRequest,
    ) -> Result<Option<Movie>, ApiError> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"UPDATE movies
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   year = COALESCE($4, year),
                   genres = COALESCE($5, genres),
                   director = COALESCE($6, director),
                   cast_members = COALESCE($7, cast_members),
                   poster_url = COALESCE($8, poster_url),
                   trailer_url = COALESCE($9, trailer_url),
                   average_rating = COALESCE($10, average_rating)
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.year)
        .bind(req.genres)
        .bind(req.director)
        .bind(req.cast_members)
        .bind(req.poster_url)
        .bind(req.trailer_url)
        .bind(req.average_rating)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn delete_movie(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_watchlist(&self, account_id: Uuid) -> Result<Vec<Movie>, ApiError> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"SELECT m.* FROM movies m
               JOIN watchlist_entries w ON w.movie_id = m.id
               WHERE w.account_id = $1
               ORDER BY m.created_at DESC"#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    // --- Blogs ---

    /// Flexible search/filter using QueryBuilder for safe parameterization.
    async fn list_blogs(
        &self,
        search: Option<String>,
        tag: Option<String>,
    ) -> Result<Vec<Blog>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(BLOG_SELECT);
        builder.push(" WHERE true ");

        if let Some(s) = search {
            // Case-insensitive search across title and content.
            let pattern = format!("%{}%", s);
            builder.push(" AND (b.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR b.content ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(t) = tag {
            builder.push(" AND ");
            builder.push_bind(t);
            builder.push(" = ANY(b.tags)");
        }

        builder.push(" ORDER BY b.created_at DESC");

        let blogs = builder
            .build_query_as::<Blog>()
            .fetch_all(&self.pool)
            .await?;
        Ok(blogs)
    }

    async fn get_blog(&self, id: Uuid) -> Result<Option<Blog>, ApiError> {
        let blog = sqlx::query_as::<_, Blog>(&format!("{BLOG_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blog)
    }

    async fn get_blogs_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>, ApiError> {
        let blogs = sqlx::query_as::<_, Blog>(&format!(
            "{BLOG_SELECT} WHERE b.author_id = $1 ORDER BY b.created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(blogs)
    }

    async fn create_blog(
        &self,
        author_id: Uuid,
        req: CreateBlogRequest,
    ) -> Result<Blog, ApiError> {
        // CTE insert + author join in one round trip. Blogs publish at
        // creation time; there is no pending state for content.
        let blog = sqlx::query_as::<_, Blog>(
            r#"WITH inserted AS (
                   INSERT INTO blogs (id, author_id, title, content, image, tags, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6, NOW())
                   RETURNING id, author_id, title, content, image, tags, created_at
               )
               SELECT i.id, i.author_id, i.title, i.content, i.image, i.tags, i.created_at,
                      a.username AS author_username, a.avatar AS author_avatar,
                      0::BIGINT AS like_count
               FROM inserted i JOIN accounts a ON i.author_id = a.id"#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.image_url.unwrap_or_default())
        .bind(&req.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<bool, ApiError> {
        // Comments are addressed by (parent_kind, parent_id) with no FK, so
        // the cascade is an explicit transaction.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comments WHERE parent_kind = 'blog' AND parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Reviews ---

    async fn list_reviews(&self, movie_id: Option<Uuid>) -> Result<Vec<Review>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(REVIEW_SELECT);
        builder.push(" WHERE true ");

        if let Some(m) = movie_id {
            builder.push(" AND r.movie_id = ");
            builder.push_bind(m);
        }

        builder.push(" ORDER BY r.created_at DESC");

        let reviews = builder
            .build_query_as::<Review>()
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, ApiError> {
        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn get_reviews_by_author(&self, author_id: Uuid) -> Result<Vec<Review>, ApiError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.author_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn create_review(
        &self,
        author_id: Uuid,
        movie_id: Uuid,
        movie_title: &str,
        rating: i32,
        content: &str,
    ) -> Result<Review, ApiError> {
        let result = sqlx::query_as::<_, Review>(
            r#"WITH inserted AS (
                   INSERT INTO reviews
                       (id, movie_id, movie_title, author_id, rating, content, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6, NOW())
                   RETURNING id, movie_id, movie_title, author_id, rating, content, created_at
               )
               SELECT i.id, i.movie_id, i.movie_title, i.author_id, i.rating, i.content,
                      i.created_at,
                      a.username AS author_username, a.avatar AS author_avatar,
                      0::BIGINT AS like_count
               FROM inserted i JOIN accounts a ON i.author_id = a.id"#,
        )
        .bind(Uuid::new_v4())
        .bind(movie_id)
        .bind(movie_title)
        .bind(author_id)
        .bind(rating)
        .bind(content)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(review) => Ok(review),
            Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
                "You have already reviewed this movie".to_string(),
            )),
            Err(e) if is_foreign_key_violation(&e) => Err(ApiError::NotFound("Movie")),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comments WHERE parent_kind = 'review' AND parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Comments ---

    async fn add_comment(
        &self,
        kind: ContentKind,
        parent_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, ApiError> {
        // Insert plus author join in a single CTE round trip.
        let comment = sqlx::query_as::<_, Comment>(
            r#"WITH inserted AS (
                   INSERT INTO comments (parent_kind, parent_id, author_id, body, created_at)
                   VALUES ($1, $2, $3, $4, NOW())
                   RETURNING id, parent_kind, parent_id, author_id, body, created_at
               )
               SELECT i.id, i.parent_kind, i.parent_id, i.author_id, i.body, i.created_at,
                      a.username AS author_username, a.avatar AS author_avatar
               FROM inserted i JOIN accounts a ON i.author_id = a.id"#,
        )
        .bind(kind.as_str())
        .bind(parent_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn get_comments(
        &self,
        kind: ContentKind,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>, ApiError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"SELECT c.id, c.parent_kind, c.parent_id, c.author_id, c.body, c.created_at,
                      a.username AS author_username, a.avatar AS author_avatar
               FROM comments c
               JOIN accounts a ON c.author_id = a.id
               WHERE c.parent_kind = $1 AND c.parent_id = $2
               ORDER BY c.created_at ASC"#,
        )
        .bind(kind.as_str())
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment_admin(&self, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all_comments(&self) -> Result<Vec<ModeratedComment>, ApiError> {
        // Parent titles come from whichever table the kind points at; review
        // parents render as "Review for <movie>".
        let comments = sqlx::query_as::<_, ModeratedComment>(
            r#"SELECT c.id, c.parent_kind, c.parent_id, c.author_id, c.body, c.created_at,
                      a.username AS author_username,
                      CASE c.parent_kind
                          WHEN 'blog' THEN (SELECT b.title FROM blogs b WHERE b.id = c.parent_id)
                          ELSE (SELECT 'Review for ' || r.movie_title
                                FROM reviews r WHERE r.id = c.parent_id)
                      END AS parent_title
               FROM comments c
               JOIN accounts a ON c.author_id = a.id
               ORDER BY c.created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    // --- Membership toggles ---

    /// The one toggle implementation behind likes and watchlists.
    ///
    /// The flip happens in a single data-modifying CTE statement: remove the
    /// pair if present, insert it otherwise. Concurrent toggles on the same
    /// pair may interleave, but each statement leaves the relation in a
    /// well-defined present-or-absent state. Read-then-write toggling is not
    /// an option here; it reintroduces lost-update races.
    async fn toggle_relation(
        &self,
        kind: RelationKind,
        object_id: Uuid,
        subject_id: Uuid,
    ) -> Result<ToggleOutcome, ApiError> {
        let table = kind.table();
        let object_col = kind.object_col();

        // The outer SELECT sees the pre-statement snapshot, so the membership
        // count is adjusted by what the CTEs actually did.
        let sql = format!(
            r#"WITH removed AS (
                   DELETE FROM {table}
                   WHERE {object_col} = $1 AND account_id = $2
                   RETURNING 1
               ), inserted AS (
                   INSERT INTO {table} ({object_col}, account_id)
                   SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM removed)
                   ON CONFLICT DO NOTHING
                   RETURNING 1
               )
               SELECT EXISTS(SELECT 1 FROM inserted) AS active,
                      (SELECT COUNT(*) FROM {table} WHERE {object_col} = $1)
                          + (SELECT COUNT(*) FROM inserted)
                          - (SELECT COUNT(*) FROM removed) AS count"#
        );

        let result = sqlx::query(&sql)
            .bind(object_id)
            .bind(subject_id)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(ToggleOutcome {
                active: row.try_get("active")?,
                count: row.try_get("count")?,
            }),
            Err(e) if is_foreign_key_violation(&e) => Err(ApiError::NotFound("Target")),
            Err(e) => Err(e.into()),
        }
    }

    // --- Dashboards & search ---

    async fn get_stats(&self) -> Result<AdminStats, ApiError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role <> $1")
            .bind(ROLE_ADMIN)
            .fetch_one(&self.pool)
            .await?;
        let total_blogs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs")
            .fetch_one(&self.pool)
            .await?;
        let total_reviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        let pending_requests: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE approved = false AND role <> $1",
        )
        .bind(ROLE_ADMIN)
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStats {
            total_users,
            total_blogs,
            total_reviews,
            pending_requests,
        })
    }

    async fn get_analytics(&self, window_days: Option<i64>) -> Result<AnalyticsReport, ApiError> {
        let stats = self.get_stats().await?;

        // Windowed counters fall back to all-time when no range is given.
        let (new_users, new_blogs, new_reviews) = match window_days {
            Some(days) => {
                let new_users: i64 = sqlx::query_scalar(
                    r#"SELECT COUNT(*) FROM accounts
                       WHERE role <> $1 AND created_at >= NOW() - ($2 || ' days')::interval"#,
                )
                .bind(ROLE_ADMIN)
                .bind(days.to_string())
                .fetch_one(&self.pool)
                .await?;
                let new_blogs: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM blogs WHERE created_at >= NOW() - ($1 || ' days')::interval",
                )
                .bind(days.to_string())
                .fetch_one(&self.pool)
                .await?;
                let new_reviews: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM reviews WHERE created_at >= NOW() - ($1 || ' days')::interval",
                )
                .bind(days.to_string())
                .fetch_one(&self.pool)
                .await?;
                (new_users, new_blogs, new_reviews)
            }
            None => (stats.total_users, stats.total_blogs, stats.total_reviews),
        };

        let blog_likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_likes")
            .fetch_one(&self.pool)
            .await?;
        let review_likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review_likes")
            .fetch_one(&self.pool)
            .await?;
        let average_rating: f32 =
            sqlx::query_scalar("SELECT COALESCE(AVG(rating), 0)::REAL FROM reviews")
                .fetch_one(&self.pool)
                .await?;

        Ok(AnalyticsReport {
            total_users: stats.total_users,
            total_blogs: stats.total_blogs,
            total_reviews: stats.total_reviews,
            pending_requests: stats.pending_requests,
            new_users,
            new_blogs,
            new_reviews,
            total_likes: blog_likes + review_likes,
            // One decimal place, matching the dashboard display.
            average_rating: (average_rating * 10.0).round() / 10.0,
        })
    }

    async fn search_movies(&self, q: &str) -> Result<Vec<Movie>, ApiError> {
        let pattern = format!("%{}%", q);
        let movies = sqlx::query_as::<_, Movie>(
            r#"SELECT * FROM movies
               WHERE title ILIKE $1
                  OR director ILIKE $1
                  OR EXISTS (SELECT 1 FROM unnest(genres) g WHERE g ILIKE $1)
                  OR EXISTS (SELECT 1 FROM unnest(cast_members) c WHERE c ILIKE $1)
               ORDER BY created_at DESC"#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn search_blogs(&self, q: &str) -> Result<Vec<Blog>, ApiError> {
        let pattern = format!("%{}%", q);
        let blogs = sqlx::query_as::<_, Blog>(&format!(
            r#"{BLOG_SELECT}
               WHERE b.title ILIKE $1
                  OR b.content ILIKE $1
                  OR EXISTS (SELECT 1 FROM unnest(b.tags) t WHERE t ILIKE $1)
               ORDER BY b.created_at DESC"#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(blogs)
    }

    async fn search_reviews(&self, q: &str) -> Result<Vec<Review>, ApiError> {
        let pattern = format!("%{}%", q);
        let reviews = sqlx::query_as::<_, Review>(&format!(
            r#"{REVIEW_SELECT}
               WHERE r.movie_title ILIKE $1 OR r.content ILIKE $1
               ORDER BY r.created_at DESC"#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }
}
