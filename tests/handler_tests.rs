use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use cinelog::{
    AppState,
    auth::{self, AuthUser},
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        Account, AccountSummary, AdminStats, AnalyticsReport, Blog, Comment, CreateBlogRequest,
        CreateMovieRequest, CreateReviewRequest, LoginRequest, ModeratedComment, Movie,
        PresignedUrlRequest, RegisterRequest, Review, ROLE_ADMIN, ROLE_USER, ToggleOutcome,
        UpdateMovieRequest, UpdateProfileRequest,
    },
    repository::{NewAccount, RelationKind, Repository},
    storage::MockStorageService,
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for handler tests. Handlers depend on the Repository
// trait, so each test pre-cans the repository outputs it needs.
pub struct MockRepoControl {
    pub account_to_return: Option<Account>,
    /// None simulates a duplicate key, surfacing as Conflict.
    pub created_account: Option<Account>,
    pub approve_result: Option<Account>,
    pub toggle_admin_result: Option<Account>,
    pub reject_result: bool,
    pub delete_result: bool,
    pub owner_delete_comment_result: bool,
    pub admin_delete_comment_result: bool,
    pub toggle_outcome: ToggleOutcome,
    pub toggle_target_missing: bool,
    pub movie_to_return: Option<Movie>,
    pub blog_to_return: Option<Blog>,
    pub review_to_return: Option<Review>,
    pub accounts_to_return: Vec<AccountSummary>,
    pub stats_to_return: AdminStats,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            account_to_return: None,
            created_account: Some(Account::default()),
            approve_result: Some(Account::default()),
            toggle_admin_result: Some(Account::default()),
            reject_result: true,
            delete_result: true,
            owner_delete_comment_result: false,
            admin_delete_comment_result: false,
            toggle_outcome: ToggleOutcome {
                active: true,
                count: 1,
            },
            toggle_target_missing: false,
            movie_to_return: Some(Movie::default()),
            blog_to_return: Some(Blog::default()),
            review_to_return: Some(Review::default()),
            accounts_to_return: vec![],
            stats_to_return: AdminStats::default(),
        }
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn get_account(&self, _id: Uuid) -> Result<Option<Account>, ApiError> {
        Ok(self.account_to_return.clone())
    }
    async fn get_account_by_email(&self, _email: &str) -> Result<Option<Account>, ApiError> {
        Ok(self.account_to_return.clone())
    }
    async fn create_account(&self, _new: NewAccount) -> Result<Account, ApiError> {
        self.created_account
            .clone()
            .ok_or_else(|| ApiError::Conflict("An account with this email or username already exists".to_string()))
    }
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, ApiError> {
        Ok(self.accounts_to_return.clone())
    }
    async fn list_pending_accounts(&self) -> Result<Vec<AccountSummary>, ApiError> {
        Ok(self.accounts_to_return.clone())
    }
    async fn approve_account(&self, _id: Uuid) -> Result<Option<Account>, ApiError> {
        Ok(self.approve_result.clone())
    }
    async fn reject_account(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(self.reject_result)
    }
    async fn delete_account(&self, _id: Uuid, _protected: &str) -> Result<bool, ApiError> {
        Ok(self.delete_result)
    }
    async fn toggle_admin_role(
        &self,
        _id: Uuid,
        _protected: &str,
    ) -> Result<Option<Account>, ApiError> {
        Ok(self.toggle_admin_result.clone())
    }
    async fn update_profile(
        &self,
        _id: Uuid,
        _req: UpdateProfileRequest,
    ) -> Result<Option<Account>, ApiError> {
        Ok(self.account_to_return.clone())
    }
    async fn ensure_protected_admin(
        &self,
        _username: &str,
        _email: &str,
        _hash: &str,
    ) -> Result<Account, ApiError> {
        Ok(Account::default())
    }
    async fn count_regular_users(&self) -> Result<i64, ApiError> {
        Ok(self.accounts_to_return.len() as i64)
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        Ok(self.movie_to_return.clone().into_iter().collect())
    }
    async fn get_movie(&self, _id: Uuid) -> Result<Option<Movie>, ApiError> {
        Ok(self.movie_to_return.clone())
    }
    async fn create_movie(&self, _req: CreateMovieRequest) -> Result<Movie, ApiError> {
        Ok(Movie::default())
    }
    async fn update_movie(
        &self,
        _id: Uuid,
        _req: UpdateMovieRequest,
    ) -> Result<Option<Movie>, ApiError> {
        Ok(self.movie_to_return.clone())
    }
    async fn delete_movie(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(self.delete_result)
    }
    async fn get_watchlist(&self, _account_id: Uuid) -> Result<Vec<Movie>, ApiError> {
        Ok(vec![])
    }

    async fn list_blogs(
        &self,
        _search: Option<String>,
        _tag: Option<String>,
    ) -> Result<Vec<Blog>, ApiError> {
        Ok(self.blog_to_return.clone().into_iter().collect())
    }
    async fn get_blog(&self, _id: Uuid) -> Result<Option<Blog>, ApiError> {
        Ok(self.blog_to_return.clone())
    }
    async fn get_blogs_by_author(&self, _author_id: Uuid) -> Result<Vec<Blog>, ApiError> {
        Ok(vec![])
    }
    async fn create_blog(
        &self,
        _author_id: Uuid,
        _req: CreateBlogRequest,
    ) -> Result<Blog, ApiError> {
        Ok(Blog::default())
    }
    async fn delete_blog(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(self.delete_result)
    }

    async fn list_reviews(&self, _movie_id: Option<Uuid>) -> Result<Vec<Review>, ApiError> {
        Ok(self.review_to_return.clone().into_iter().collect())
    }
    async fn get_review(&self, _id: Uuid) -> Result<Option<Review>, ApiError> {
        Ok(self.review_to_return.clone())
    }
    async fn get_reviews_by_author(&self, _author_id: Uuid) -> Result<Vec<Review>, ApiError> {
        Ok(vec![])
    }
    async fn create_review(
        &self,
        _author_id: Uuid,
        _movie_id: Uuid,
        _movie_title: &str,
        _rating: i32,
        _content: &str,
    ) -> Result<Review, ApiError> {
        Ok(Review::default())
    }
    async fn delete_review(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(self.delete_result)
    }

    async fn add_comment(
        &self,
        _kind: cinelog::models::ContentKind,
        _parent_id: Uuid,
        _author_id: Uuid,
        _body: &str,
    ) -> Result<Comment, ApiError> {
        Ok(Comment::default())
    }
    async fn get_comments(
        &self,
        _kind: cinelog::models::ContentKind,
        _parent_id: Uuid,
    ) -> Result<Vec<Comment>, ApiError> {
        Ok(vec![])
    }
    async fn delete_comment(&self, _id: i64, _author_id: Uuid) -> Result<bool, ApiError> {
        Ok(self.owner_delete_comment_result)
    }
    async fn delete_comment_admin(&self, _id: i64) -> Result<bool, ApiError> {
        Ok(self.admin_delete_comment_result)
    }
    async fn list_all_comments(&self) -> Result<Vec<ModeratedComment>, ApiError> {
        Ok(vec![])
    }

    async fn toggle_relation(
        &self,
        _kind: RelationKind,
        _object_id: Uuid,
        _subject_id: Uuid,
    ) -> Result<ToggleOutcome, ApiError> {
        if self.toggle_target_missing {
            Err(ApiError::NotFound("Target"))
        } else {
            Ok(self.toggle_outcome)
        }
    }

    async fn get_stats(&self) -> Result<AdminStats, ApiError> {
        Ok(self.stats_to_return.clone())
    }
    async fn get_analytics(&self, _window_days: Option<i64>) -> Result<AnalyticsReport, ApiError> {
        Ok(AnalyticsReport::default())
    }
    async fn search_movies(&self, _q: &str) -> Result<Vec<Movie>, ApiError> {
        Ok(vec![])
    }
    async fn search_blogs(&self, _q: &str) -> Result<Vec<Blog>, ApiError> {
        Ok(vec![])
    }
    async fn search_reviews(&self, _q: &str) -> Result<Vec<Review>, ApiError> {
        Ok(vec![])
    }
}

// --- TEST UTILITIES ---

const TEST_ID: Uuid = Uuid::from_u128(123);
const TEST_ADMIN_ID: Uuid = Uuid::from_u128(456);

fn create_test_state(repo_control: MockRepoControl, storage: MockStorageService) -> AppState {
    AppState {
        repo: Arc::new(repo_control),
        storage: Arc::new(storage),
        config: AppConfig::default(),
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: TEST_ADMIN_ID,
        email: "mod@cinelog.local".to_string(),
        role: ROLE_ADMIN.to_string(),
    }
}

fn regular_user() -> AuthUser {
    AuthUser {
        id: TEST_ID,
        email: "user@example.com".to_string(),
        role: ROLE_USER.to_string(),
    }
}

fn stored_account(email: &str, password: &str, role: &str, approved: bool) -> Account {
    Account {
        id: TEST_ID,
        username: "someone".to_string(),
        email: email.to_string(),
        password_hash: auth::hash_password(password).unwrap(),
        role: role.to_string(),
        approved,
        ..Account::default()
    }
}

fn assert_status(err: ApiError, status: StatusCode, code: &str) {
    assert_eq!(err.status(), status);
    assert_eq!(err.code(), code);
}

// --- REGISTRATION / LOGIN ---

#[test]
async fn test_register_rejects_blank_fields() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = RegisterRequest {
        username: "  ".to_string(),
        email: "a@x.com".to_string(),
        password: "pw123456".to_string(),
    };

    let err = handlers::register(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
}

#[test]
async fn test_register_rejects_short_password() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = RegisterRequest {
        username: "someone".to_string(),
        email: "a@x.com".to_string(),
        password: "pw1".to_string(),
    };

    let err = handlers::register(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
}

#[test]
async fn test_register_pending_account_gets_no_token() {
    // Default config: auto_approve_accounts = false.
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = RegisterRequest {
        username: "someone".to_string(),
        email: "a@x.com".to_string(),
        password: "pw123456".to_string(),
    };

    let (status, Json(body)) = handlers::register(State(state), Json(payload)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.token.is_none());
}

#[test]
async fn test_register_duplicate_is_conflict() {
    let state = create_test_state(
        MockRepoControl {
            created_account: None,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = RegisterRequest {
        username: "someone".to_string(),
        email: "a@x.com".to_string(),
        password: "pw123456".to_string(),
    };

    let err = handlers::register(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::CONFLICT, "conflict");
}

#[test]
async fn test_login_unknown_email_is_invalid_credentials() {
    let state = create_test_state(
        MockRepoControl {
            account_to_return: None,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = LoginRequest {
        email: "ghost@example.com".to_string(),
        password: "pw123456".to_string(),
    };

    let err = handlers::login(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "invalid_credentials");
}

#[test]
async fn test_login_wrong_password_is_invalid_credentials() {
    let account = stored_account("a@x.com", "correct-horse", ROLE_USER, true);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(account),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = LoginRequest {
        email: "a@x.com".to_string(),
        password: "battery-staple".to_string(),
    };

    let err = handlers::login(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "invalid_credentials");
}

#[test]
async fn test_login_pending_account_is_not_approved() {
    let account = stored_account("a@x.com", "pw123456", ROLE_USER, false);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(account),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = LoginRequest {
        email: "a@x.com".to_string(),
        password: "pw123456".to_string(),
    };

    let err = handlers::login(State(state), Json(payload)).await.unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "not_approved");
}

#[test]
async fn test_login_admin_bypasses_approval_gate() {
    // Admin accounts authenticate even when the approved flag is unset.
    let account = stored_account("mod@cinelog.local", "pw123456", ROLE_ADMIN, false);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(account),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = LoginRequest {
        email: "mod@cinelog.local".to_string(),
        password: "pw123456".to_string(),
    };

    let result = handlers::login(State(state), Json(payload)).await;
    assert!(result.is_ok());
    let Json(body) = result.unwrap();
    assert!(!body.token.is_empty());
}

#[test]
async fn test_login_approved_account_token_carries_identity() {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    let account = stored_account("a@x.com", "pw123456", ROLE_USER, true);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(account.clone()),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = LoginRequest {
        email: "a@x.com".to_string(),
        password: "pw123456".to_string(),
    };

    let Json(body) = handlers::login(State(state), Json(payload)).await.unwrap();

    let key = DecodingKey::from_secret(AppConfig::default().jwt_secret.as_bytes());
    let claims = decode::<cinelog::auth::Claims>(&body.token, &key, &Validation::default())
        .unwrap()
        .claims;
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.role, ROLE_USER);
}

// --- APPROVAL WORKFLOW ---

#[test]
async fn test_approve_request_requires_admin() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());

    let err = handlers::approve_request(regular_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "forbidden");
}

#[test]
async fn test_approve_unknown_request_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            approve_result: None,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::approve_request(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

#[test]
async fn test_reject_processed_request_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            reject_result: false,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::reject_request(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

#[test]
async fn test_reject_pending_request_succeeds() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());

    let status = handlers::reject_request(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// --- PROTECTED ADMIN EXEMPTION ---

#[test]
async fn test_toggle_admin_on_protected_admin_is_forbidden() {
    // AppConfig::default() marks root@cinelog.local as the protected admin.
    let target = stored_account("root@cinelog.local", "irrelevant", ROLE_ADMIN, true);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(target),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::toggle_admin_role(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "forbidden");
}

#[test]
async fn test_delete_protected_admin_is_forbidden() {
    let target = stored_account("root@cinelog.local", "irrelevant", ROLE_ADMIN, true);
    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(target),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::delete_account(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "forbidden");
}

#[test]
async fn test_toggle_admin_on_regular_account_succeeds() {
    let target = stored_account("a@x.com", "irrelevant", ROLE_USER, true);
    let mut flipped = target.clone();
    flipped.role = ROLE_ADMIN.to_string();

    let state = create_test_state(
        MockRepoControl {
            account_to_return: Some(target),
            toggle_admin_result: Some(flipped),
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let Json(summary) = handlers::toggle_admin_role(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap();
    assert_eq!(summary.role, ROLE_ADMIN);
}

#[test]
async fn test_delete_unknown_account_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            account_to_return: None,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::delete_account(admin_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

// --- CONTENT ---

#[test]
async fn test_create_review_rejects_out_of_range_rating() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    for rating in [0, 11, -3] {
        let payload = CreateReviewRequest {
            movie_id: TEST_ID,
            rating,
            content: "Great".to_string(),
        };
        let err = handlers::create_review(regular_user(), State(state.clone()), Json(payload))
            .await
            .unwrap_err();
        assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
    }
}

#[test]
async fn test_create_review_for_missing_movie_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            movie_to_return: None,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );
    let payload = CreateReviewRequest {
        movie_id: TEST_ID,
        rating: 8,
        content: "Great".to_string(),
    };

    let err = handlers::create_review(regular_user(), State(state), Json(payload))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

#[test]
async fn test_create_blog_requires_title_and_content() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = CreateBlogRequest {
        title: "A title".to_string(),
        content: "   ".to_string(),
        ..CreateBlogRequest::default()
    };

    let err = handlers::create_blog(regular_user(), State(state), Json(payload))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
}

#[test]
async fn test_toggle_like_on_missing_target_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            toggle_target_missing: true,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::toggle_blog_like(regular_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

#[test]
async fn test_toggle_like_reports_new_state() {
    let state = create_test_state(
        MockRepoControl {
            toggle_outcome: ToggleOutcome {
                active: false,
                count: 4,
            },
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let Json(outcome) = handlers::toggle_blog_like(regular_user(), State(state), Path(TEST_ID))
        .await
        .unwrap();
    assert!(!outcome.active);
    assert_eq!(outcome.count, 4);
}

#[test]
async fn test_delete_comment_admin_override() {
    let state = create_test_state(
        MockRepoControl {
            admin_delete_comment_result: true,
            owner_delete_comment_result: false,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let status = handlers::delete_comment(admin_user(), State(state), Path(123i64))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[test]
async fn test_delete_comment_not_owner_is_not_found() {
    let state = create_test_state(
        MockRepoControl {
            owner_delete_comment_result: false,
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let err = handlers::delete_comment(regular_user(), State(state), Path(123i64))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::NOT_FOUND, "not_found");
}

// --- ADMIN DASHBOARDS & RBAC ---

#[test]
async fn test_admin_stats_forbidden_for_regular_user() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());

    let err = handlers::get_admin_stats(regular_user(), State(state))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "forbidden");
}

#[test]
async fn test_admin_stats_success() {
    let state = create_test_state(
        MockRepoControl {
            stats_to_return: AdminStats {
                total_users: 7,
                total_blogs: 3,
                total_reviews: 2,
                pending_requests: 1,
            },
            ..MockRepoControl::default()
        },
        MockStorageService::new(),
    );

    let Json(stats) = handlers::get_admin_stats(admin_user(), State(state))
        .await
        .unwrap();
    assert_eq!(stats.total_users, 7);
    assert_eq!(stats.pending_requests, 1);
}

#[test]
async fn test_analytics_rejects_unknown_time_range() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let params = handlers::AnalyticsParams {
        time_range: Some("14d".to_string()),
    };

    let err = handlers::get_analytics(admin_user(), State(state), Query(params))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
}

#[test]
async fn test_create_movie_requires_admin() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = CreateMovieRequest {
        title: "Heat".to_string(),
        description: "Crime drama".to_string(),
        year: 1995,
        director: "Michael Mann".to_string(),
        ..CreateMovieRequest::default()
    };

    let err = handlers::create_movie(regular_user(), State(state), Json(payload))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::FORBIDDEN, "forbidden");
}

// --- SEARCH & UPLOADS ---

#[test]
async fn test_search_requires_query() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let params = handlers::SearchParams {
        q: Some("   ".to_string()),
        kind: None,
    };

    let err = handlers::search(State(state), Query(params)).await.unwrap_err();
    assert_status(err, StatusCode::BAD_REQUEST, "bad_request");
}

#[test]
async fn test_search_kind_limits_sections() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let params = handlers::SearchParams {
        q: Some("heat".to_string()),
        kind: Some("movies".to_string()),
    };

    let Json(results) = handlers::search(State(state), Query(params)).await.unwrap();
    assert!(results.movies.is_some());
    assert!(results.blogs.is_none());
    assert!(results.reviews.is_none());
}

#[test]
async fn test_presigned_url_success() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new());
    let payload = PresignedUrlRequest {
        filename: "poster.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
    };

    let Json(body) = handlers::get_presigned_url(regular_user(), State(state), Json(payload))
        .await
        .unwrap();

    assert!(body.upload_url.starts_with("http://localhost:9000/mock-bucket/"));
    assert!(body.upload_url.contains(&body.resource_key));
    assert!(body.resource_key.starts_with("uploads/"));
    assert!(body.resource_key.ends_with(".jpg"));
}

#[test]
async fn test_presigned_url_storage_failure_is_internal() {
    let state = create_test_state(MockRepoControl::default(), MockStorageService::new_failing());
    let payload = PresignedUrlRequest {
        filename: "poster.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
    };

    let err = handlers::get_presigned_url(regular_user(), State(state), Json(payload))
        .await
        .unwrap_err();
    assert_status(err, StatusCode::INTERNAL_SERVER_ERROR, "internal");
}
