//! Administrative authorization gate
//!
//! [`AdminIdentity`] is an actix-web extractor: listing it as a handler
//! argument runs the gate before the handler body. A handler that receives an
//! `AdminIdentity` is guaranteed the caller presented a bearer token the
//! identity provider accepts and belongs to the `admins` group.

use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use log::{debug, warn};
use thiserror::Error;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::UserGroup;
use crate::state::AppState;
use crate::utils::ApiError;

/// Caller resolved from a bearer credential; lives for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Not authenticated")]
    MissingCredential,

    #[error("Could not validate credentials")]
    InvalidCredential(String),

    #[error("User does not have admin privileges")]
    NotAnAdmin(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(IdentityError),
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::MissingCredential | AuthorizationError::InvalidCredential(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthorizationError::NotAnAdmin(_) => ApiError::Forbidden(err.to_string()),
            AuthorizationError::Unavailable(_) => {
                ApiError::internal("An unexpected error occurred while authorizing the request.")
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
#[must_use]
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve a bearer credential and require `admins` membership
///
/// # Errors
///
/// Returns an error if:
/// - The header is missing or not a bearer credential
/// - The provider does not accept the token
/// - The resolved user is not in the `admins` group
/// - The identity provider cannot be reached or the group lookup fails
pub async fn require_admin(
    provider: &dyn IdentityProvider,
    pool_id: &str,
    authorization: Option<&str>,
) -> Result<AdminIdentity, AuthorizationError> {
    let token = authorization
        .and_then(parse_bearer)
        .ok_or(AuthorizationError::MissingCredential)?;

    let username = provider.get_user(token).await.map_err(|e| match e {
        IdentityError::Unexpected(_) => AuthorizationError::Unavailable(e),
        other => {
            debug!("Bearer credential rejected: {other}");
            AuthorizationError::InvalidCredential(other.to_string())
        }
    })?;

    let groups = provider
        .admin_list_groups_for_user(pool_id, &username)
        .await
        .map_err(|e| match e {
            // The token outlived its user
            IdentityError::UserNotFound(msg) => AuthorizationError::InvalidCredential(msg),
            other => AuthorizationError::Unavailable(other),
        })?;

    if !groups.iter().any(|g| g == UserGroup::Admins.as_str()) {
        warn!("User '{username}' attempted an admin-only operation");
        return Err(AuthorizationError::NotAnAdmin(username));
    }

    Ok(AdminIdentity { username, groups })
}

impl FromRequest for AdminIdentity {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        Box::pin(authorize(state, authorization))
    }
}

async fn authorize(
    state: Option<web::Data<AppState>>,
    authorization: Option<String>,
) -> Result<AdminIdentity, ApiError> {
    let state = state.ok_or_else(|| {
        log::error!("AppState is not registered; admin routes cannot be authorized");
        ApiError::internal("An unexpected error occurred while authorizing the request.")
    })?;

    require_admin(
        state.provider.as_ref(),
        &state.pool.user_pool_id,
        authorization.as_deref(),
    )
    .await
    .map_err(|e| {
        if let AuthorizationError::Unavailable(inner) = &e {
            log::error!("Admin authorization could not complete: {inner}");
        }
        ApiError::from(e)
    })
}
