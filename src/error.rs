use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// ApiError
///
/// The single error taxonomy for the whole API. Every failure a handler can
/// produce maps to exactly one HTTP status and one stable machine-readable
/// code; errors are terminal for the request and are never retried locally.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or semantically invalid input (missing fields, bad
    /// coercions, out-of-range ratings).
    #[error("{0}")]
    BadRequest(String),

    /// Unknown email or password mismatch. Deliberately indistinguishable
    /// between the two cases.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired, or otherwise unverifiable bearer token.
    #[error("Access denied")]
    Unauthorized,

    /// Authenticated but not allowed: insufficient role, or the
    /// protected-admin exemption was triggered.
    #[error("{0}")]
    Forbidden(String),

    /// Account exists and the credentials match, but the access request has
    /// not been approved yet.
    #[error("Account not approved yet. Please wait for admin approval.")]
    NotApproved,

    /// Target entity absent or already processed.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate unique key (email, username, one-review-per-movie).
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store or provider failure. Details are logged server-side
    /// and never leaked to the caller.
    #[error("Internal server error")]
    Internal,
}

/// Wire shape for every error response body.
#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Stable machine-readable code, part of the public API contract.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotApproved => "not_approved",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::NotApproved => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Store-failure propagation policy: a row lookup miss surfaces as the
/// caller-supplied `NotFound` at the call site, everything else is logged and
/// collapsed into `Internal`.
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("store error: {:?}", e);
        ApiError::Internal
    }
}

/// True when the database rejected an insert/update because of a unique
/// constraint. Used to translate duplicate keys into `Conflict`.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

/// True when the database rejected a write because a referenced row is gone.
/// Used to translate dangling targets into `NotFound`.
pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")
    )
}
