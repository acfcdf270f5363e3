//! HTTP error responses
//!
//! Every handler returns `Result<HttpResponse, ApiError>`. `ApiError` is the
//! boundary type: adapter and gate failures are translated into it, and it
//! renders itself as `{"detail": "..."}` with the matching status code.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Challenge header sent with every 401
const BEARER_CHALLENGE: &str = "Bearer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or invalid request body (422)
    #[error("{0}")]
    Validation(String),

    /// Login rejected by the identity provider (401)
    #[error("Incorrect username or password: {0}")]
    AuthFailure(String),

    /// Challenge answer rejected by the identity provider (400)
    #[error("{0}")]
    ChallengeFailure(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid bearer credential (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Valid credential without the required group (403)
    #[error("{0}")]
    Forbidden(String),

    /// Generic failure; the message never carries upstream detail (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn internal(message: &str) -> Self {
        ApiError::Internal(message.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AuthFailure(_) | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ChallengeFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, BEARER_CHALLENGE));
        }
        builder.json(json!({ "detail": self.to_string() }))
    }
}
