// Administrative user management; every handler requires an admin bearer
use actix_web::{web, HttpResponse};

use crate::authorization::AdminIdentity;
use crate::identity::IdentityError;
use crate::models::UserSummary;
use crate::state::AppState;
use crate::utils::{ApiError, LoggingHelper};
use crate::validation::ValidatedJson;

use super::types::{CreatedUser, SignUpRequest, SignUpResponse};

const SIGNUP_FAILED: &str = "An unexpected error occurred while creating the user.";
const DELETE_FAILED: &str = "An unexpected error occurred while deleting the user.";
const LIST_FAILED: &str = "An unexpected error occurred while listing users.";

/// Create a user with a temporary password and place it in a group
///
/// The user must choose a new password at first login.
///
/// # Errors
///
/// Returns an error if:
/// - The body is malformed (422)
/// - The caller is not an authenticated admin (401/403)
/// - The username is taken (409)
/// - Creating the user or adding it to the group fails (500)
pub async fn signup(
    body: ValidatedJson<SignUpRequest>,
    admin: AdminIdentity,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let pool_id = &state.pool.user_pool_id;
    LoggingHelper::log_admin_action(
        &admin.username,
        &format!("creating user '{}' in group '{}'", request.username, request.user_group),
    );

    let record = state
        .provider
        .admin_create_user(
            pool_id,
            &request.username,
            &request.email,
            &request.temporary_password,
        )
        .await
        .map_err(|e| match e {
            IdentityError::DuplicateUser(_) => {
                LoggingHelper::log_rejected("Signup", &request.username, &e);
                ApiError::Conflict("A user with this username already exists.".to_string())
            }
            other => {
                LoggingHelper::log_unexpected("Signup", &request.username, &other);
                ApiError::internal(SIGNUP_FAILED)
            }
        })?;

    // A user left outside any group is not rolled back; the admin can delete it
    state
        .provider
        .admin_add_user_to_group(pool_id, &request.username, request.user_group)
        .await
        .map_err(|e| {
            LoggingHelper::log_unexpected("Adding user to group", &request.username, &e);
            ApiError::internal(SIGNUP_FAILED)
        })?;

    log::info!(
        "User '{}' created and added to group '{}'",
        record.username,
        request.user_group
    );

    Ok(HttpResponse::Created().json(SignUpResponse {
        message: "User created successfully.".to_string(),
        user: CreatedUser {
            user_create_date: record.user_create_date(),
            username: record.username,
        },
    }))
}

/// Delete a user by username
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an authenticated admin (401/403)
/// - The user does not exist (404)
/// - The provider call fails for any other reason (500)
pub async fn delete_user(
    path: web::Path<String>,
    admin: AdminIdentity,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    LoggingHelper::log_admin_action(&admin.username, &format!("deleting user '{username}'"));

    state
        .provider
        .admin_delete_user(&state.pool.user_pool_id, &username)
        .await
        .map_err(|e| match e {
            IdentityError::UserNotFound(_) => {
                LoggingHelper::log_rejected("Delete", &username, &e);
                ApiError::NotFound("User not found.".to_string())
            }
            other => {
                LoggingHelper::log_unexpected("Delete", &username, &other);
                ApiError::internal(DELETE_FAILED)
            }
        })?;

    log::info!("User '{username}' deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// List every user of the pool with its groups
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an authenticated admin (401/403)
/// - The provider call fails (500)
pub async fn list_users(
    admin: AdminIdentity,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    LoggingHelper::log_admin_action(&admin.username, "listing users");

    let users = state
        .provider
        .admin_list_users(&state.pool.user_pool_id)
        .await
        .map_err(|e| {
            LoggingHelper::log_unexpected("List users", &admin.username, &e);
            ApiError::internal(LIST_FAILED)
        })?;

    let summaries: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}
