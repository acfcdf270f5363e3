// Login handlers: password login, challenge response, legacy login
use actix_web::{web, HttpResponse};

use crate::identity::IdentityError;
use crate::state::AppState;
use crate::utils::{ApiError, LoggingHelper};
use crate::validation::ValidatedJson;

use super::types::{LoginRequest, RespondToChallengeRequest};

const LOGIN_FAILED: &str = "An unexpected error occurred during login.";
const CHALLENGE_FAILED: &str = "An unexpected error occurred while responding to the challenge.";

/// Authenticate with username and password
///
/// Returns the token bundle, or a `NEW_PASSWORD_REQUIRED` challenge that must
/// be answered through [`respond_to_challenge`]. Both are 200 responses.
///
/// # Errors
///
/// Returns an error if:
/// - The body is malformed (422)
/// - The provider rejects the credentials (401)
/// - The provider call fails for any other reason (500)
pub async fn login(
    body: ValidatedJson<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    LoggingHelper::log_login_attempt(&request.username);

    let result = state
        .provider
        .initiate_auth(
            &state.pool.user_pool_id,
            &state.pool.client_id,
            &request.username,
            &request.password,
        )
        .await
        .map_err(|e| login_error(&request.username, &e))?;

    LoggingHelper::log_authentication_outcome(&request.username, &result);
    Ok(HttpResponse::Ok().json(result.to_response_body()))
}

/// Answer a `NEW_PASSWORD_REQUIRED` challenge
///
/// # Errors
///
/// Returns an error if:
/// - The body is malformed (422)
/// - The session is invalid, expired or belongs to another user, or the new
///   password violates the pool policy (400)
/// - The provider call fails for any other reason (500)
pub async fn respond_to_challenge(
    body: ValidatedJson<RespondToChallengeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();

    let result = state
        .provider
        .respond_to_challenge(
            &state.pool.user_pool_id,
            &state.pool.client_id,
            &request.username,
            &request.session,
            &request.new_password,
        )
        .await
        .map_err(|e| challenge_error(&request.username, &e))?;

    LoggingHelper::log_authentication_outcome(&request.username, &result);
    Ok(HttpResponse::Ok().json(result.to_response_body()))
}

/// Legacy login route
///
/// Relays the provider's authentication envelope unchanged. Clients of this
/// route handle challenges themselves.
///
/// # Errors
///
/// Same as [`login`].
pub async fn legacy_login(
    body: ValidatedJson<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    LoggingHelper::log_login_attempt(&request.username);

    let result = state
        .provider
        .initiate_auth(
            &state.pool.user_pool_id,
            &state.pool.client_id,
            &request.username,
            &request.password,
        )
        .await
        .map_err(|e| login_error(&request.username, &e))?;

    LoggingHelper::log_authentication_outcome(&request.username, &result);
    Ok(HttpResponse::Ok().json(result.to_provider_envelope()))
}

fn login_error(username: &str, err: &IdentityError) -> ApiError {
    match err {
        IdentityError::AuthFailure(detail) => {
            LoggingHelper::log_rejected("Login", username, err);
            ApiError::AuthFailure(detail.clone())
        }
        _ => {
            LoggingHelper::log_unexpected("Login", username, err);
            ApiError::internal(LOGIN_FAILED)
        }
    }
}

fn challenge_error(username: &str, err: &IdentityError) -> ApiError {
    match err {
        IdentityError::ChallengeFailure(detail) => {
            LoggingHelper::log_rejected("Challenge response", username, err);
            ApiError::ChallengeFailure(detail.clone())
        }
        _ => {
            LoggingHelper::log_unexpected("Challenge response", username, err);
            ApiError::internal(CHALLENGE_FAILED)
        }
    }
}
