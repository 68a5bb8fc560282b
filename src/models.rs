use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Role constants ---

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

// --- Core Application Schemas (Mapped to Database) ---

/// Account
///
/// The canonical identity record from the `accounts` table, including the
/// password hash. Internal to the repository and auth layers; API responses
/// use [`AccountSummary`] so the hash can never be serialized.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    /// Stored lowercased; uniqueness is case-insensitive by policy.
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub bio: String,
    /// RBAC field: 'user' or 'admin'.
    pub role: String,
    /// Access-request state: false = pending, true = approved.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// AccountSummary
///
/// The externally visible projection of an [`Account`]. This is the only
/// account shape that crosses the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub role: String,
    pub approved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountSummary {
    fn from(a: Account) -> Self {
        AccountSummary {
            id: a.id,
            username: a.username,
            email: a.email,
            avatar: a.avatar,
            bio: a.bio,
            role: a.role,
            approved: a.approved,
            created_at: a.created_at,
        }
    }
}

/// Movie
///
/// A catalog record from the `movies` table. Managed by admins, readable by
/// everyone.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub genres: Vec<String>,
    pub director: String,
    /// Maps SQL column "cast_members" to the JSON key "cast"; the column is
    /// renamed because `cast` collides with the SQL keyword.
    #[serde(rename = "cast")]
    pub cast_members: Vec<String>,
    pub poster_url: String,
    pub trailer_url: String,
    pub average_rating: f32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Blog
///
/// A blog post row enriched with its author and like count. The join fields
/// are filled by the repository queries and default to empty when a query
/// does not provide them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Blog {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    /// Durable URL or object key; the raw bytes live in object storage.
    pub image: String,
    pub tags: Vec<String>,
    #[sqlx(default)]
    pub like_count: i64,
    // Loaded via a JOIN against `accounts`.
    #[sqlx(default)]
    pub author_username: Option<String>,
    #[sqlx(default)]
    pub author_avatar: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Review
///
/// A movie review row, same enrichment pattern as [`Blog`]. The movie title
/// is denormalized at creation time so review lists render without a second
/// catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub movie_title: String,
    pub author_id: Uuid,
    /// 1 through 10 inclusive.
    pub rating: i32,
    pub content: String,
    #[sqlx(default)]
    pub like_count: i64,
    #[sqlx(default)]
    pub author_username: Option<String>,
    #[sqlx(default)]
    pub author_avatar: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ContentKind
///
/// Discriminates the two comment-bearing, likeable content types. Blogs and
/// reviews are structurally identical for moderation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentKind {
    Blog,
    Review,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::Review => "review",
        }
    }
}

/// Comment
///
/// A comment row from the `comments` table, augmented with the author's
/// username and avatar (a join operation). Comments belong to exactly one
/// parent (blog or review) and are removed with it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    // BigInt (i64) comment IDs; comments are by far the highest-volume rows.
    pub id: i64,
    pub parent_kind: String,
    pub parent_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    #[sqlx(default)]
    pub author_username: Option<String>,
    #[sqlx(default)]
    pub author_avatar: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ModeratedComment
///
/// The flat admin moderation view: every comment in the system regardless of
/// parent kind, enriched with the parent's title for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ModeratedComment {
    pub id: i64,
    pub parent_kind: String,
    pub parent_id: Uuid,
    #[sqlx(default)]
    pub parent_title: Option<String>,
    pub author_id: Uuid,
    pub body: String,
    #[sqlx(default)]
    pub author_username: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Input Coercion Helpers ---

/// Accepts either a JSON array of strings or a single comma-joined string and
/// produces a trimmed, non-empty list. Any other shape is a deserialization
/// error surfaced as a 4xx at the extractor boundary.
pub fn coerce_string_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    let items = match Raw::deserialize(de)? {
        Raw::List(v) => v,
        Raw::Joined(s) => s.split(',').map(str::to_string).collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Option-wrapped variant of [`coerce_string_list`] for partial updates.
pub fn coerce_opt_string_list<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "coerce_string_list")] Vec<String>);

    Ok(Option::<Wrap>::deserialize(de)?.map(|w| w.0))
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for submitting an access request (POST /auth/register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input payload for authentication (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Input payload for the admin-creates-admin endpoint (POST /admin/accounts).
/// Accounts created here are approved immediately.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input payload for publishing a blog post (POST /blogs). The image is an
/// object key from the presigned upload flow or an external URL; `tags`
/// tolerates both array and comma-joined form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "coerce_string_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Input payload for publishing a review (POST /reviews). The movie title is
/// resolved from the catalog, never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub movie_id: Uuid,
    pub rating: i32,
    pub content: String,
}

/// Input payload for posting a comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Partial update payload for the authenticated profile (PUT /me).
///
/// Uses `Option<T>` plus `skip_serializing_if` so only provided fields are
/// included in the JSON payload and only those columns change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_key: Option<String>,
}

/// Input payload for adding a catalog entry (POST /admin/movies).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMovieRequest {
    pub title: String,
    pub description: String,
    pub year: i32,
    #[serde(default, deserialize_with = "coerce_string_list")]
    pub genres: Vec<String>,
    pub director: String,
    #[serde(default, rename = "cast", deserialize_with = "coerce_string_list")]
    pub cast_members: Vec<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f32>,
}

/// Partial update payload for a catalog entry (PUT /admin/movies/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateMovieRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(
        default,
        deserialize_with = "coerce_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub genres: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,

    #[serde(
        default,
        rename = "cast",
        deserialize_with = "coerce_opt_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub cast_members: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "poster.jpg")]
    pub filename: String,
    /// The MIME type, used to constrain the upload to the allowed type.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// Output schema containing the secure, temporary URL for client-to-cloud
/// file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key where the file will land, stored on the owning record.
    pub resource_key: String,
}

// --- Output Schemas ---

/// Successful authentication response: a signed session token plus the
/// account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountSummary,
}

/// Registration response. `token` is only present when the deployment
/// auto-approves accounts; pending accounts cannot authenticate yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterResponse {
    pub account: AccountSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Result of a membership toggle: whether the relation now holds, and the
/// object's current membership count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ToggleOutcome {
    pub active: bool,
    pub count: i64,
}

/// Output schema for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_blogs: i64,
    pub total_reviews: i64,
    /// Accounts still waiting for approval.
    pub pending_requests: i64,
}

/// Output schema for the analytics dashboard (GET /admin/analytics).
/// Windowed counts cover the requested time range; totals are global.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsReport {
    pub total_users: i64,
    pub total_blogs: i64,
    pub total_reviews: i64,
    pub pending_requests: i64,
    pub new_users: i64,
    pub new_blogs: i64,
    pub new_reviews: i64,
    /// Likes across blogs and reviews combined.
    pub total_likes: i64,
    pub average_rating: f32,
}

/// Output schema for cross-entity search (GET /search). Sections are omitted
/// when the `kind` filter excludes them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<Movie>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blogs: Option<Vec<Blog>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

/// Output schema for the aggregated profile view (GET /me/complete):
/// the account plus everything it has written and saved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CompleteProfile {
    pub account: AccountSummary,
    pub blogs: Vec<Blog>,
    pub reviews: Vec<Review>,
    pub watchlist: Vec<Movie>,
}

/// Output schema for the public homepage counter (GET /stats/users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserCount {
    pub user_count: i64,
}
