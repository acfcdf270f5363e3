// Request bodies accepted by the auth routes
use serde::{Deserialize, Serialize};

use crate::models::UserGroup;
use crate::validate_fields;
use crate::validation::{require_email, require_non_empty, Validate};

/// Body of `/auth/login` and the legacy `/login`
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        validate_fields!(
            require_non_empty("username", &self.username),
            require_non_empty("password", &self.password),
        )
    }
}

#[derive(Deserialize)]
pub struct RespondToChallengeRequest {
    pub username: String,
    pub session: String,
    pub new_password: String,
}

impl Validate for RespondToChallengeRequest {
    fn validate(&self) -> Result<(), String> {
        validate_fields!(
            require_non_empty("username", &self.username),
            require_non_empty("session", &self.session),
            require_non_empty("new_password", &self.new_password),
        )
    }
}

/// Body of `/auth/signup`; `user_group` must name an existing group
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub temporary_password: String,
    pub user_group: UserGroup,
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), String> {
        validate_fields!(
            require_non_empty("username", &self.username),
            require_email("email", &self.email),
            require_non_empty("temporary_password", &self.temporary_password),
        )
    }
}

/// Created user as echoed back by `/auth/signup`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedUser {
    pub username: String,
    pub user_create_date: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignUpResponse {
    pub message: String,
    pub user: CreatedUser,
}
