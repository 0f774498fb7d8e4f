use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// StoreError  - anything that went wrong inside a persistence backend
// ApiError    - what a handler reports back over HTTP
//
// Store failures are logged with full detail and surface to callers as a
// generic 500. Client mistakes surface as 400 with the reason.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("counter overflow for user {0}")]
    CounterOverflow(u32),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid user ID")]
    InvalidUserId,

    #[error("internal server error")]
    Store(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidUserId => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(inner) = self {
            tracing::error!(error = %inner, "Store operation failed");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

// ============================================================================
// Extractor error handlers
// ============================================================================
//
// actix-web answers extractor failures with plain text by default. These
// handlers route them through ApiError so every 400 carries the same JSON body.
//

pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
