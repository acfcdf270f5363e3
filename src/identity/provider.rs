//! Identity provider interface
//!
//! This trait is the single point of contact with the managed identity
//! service. Handlers receive it as `Arc<dyn IdentityProvider>` through the
//! application state, so the production Cognito client and the in-memory test
//! double are interchangeable.

use async_trait::async_trait;

use crate::identity::IdentityError;
use crate::models::auth::AuthenticationResult;
use crate::models::{UserGroup, UserRecord};

/// Operations the API needs from the managed identity provider
///
/// Implementations hold no per-request state and never retry; every call is a
/// single round-trip whose failure is reported as an [`IdentityError`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start a username/password login
    ///
    /// # Errors
    ///
    /// Returns `AuthFailure` when the provider rejects the credentials.
    async fn initiate_auth(
        &self,
        pool_id: &str,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, IdentityError>;

    /// Answer a `NEW_PASSWORD_REQUIRED` challenge
    ///
    /// `session` is forwarded exactly as it was issued.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeFailure` when the session is invalid, expired, was
    /// issued for another user, or the new password violates the pool policy.
    async fn respond_to_challenge(
        &self,
        pool_id: &str,
        client_id: &str,
        username: &str,
        session: &str,
        new_password: &str,
    ) -> Result<AuthenticationResult, IdentityError>;

    /// Create a user with a temporary password
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUser` when the username is taken.
    async fn admin_create_user(
        &self,
        pool_id: &str,
        username: &str,
        email: &str,
        temporary_password: &str,
    ) -> Result<UserRecord, IdentityError>;

    /// # Errors
    ///
    /// Returns `UserNotFound` when no such user exists.
    async fn admin_delete_user(&self, pool_id: &str, username: &str) -> Result<(), IdentityError>;

    /// List every user of the pool; an empty pool is not an error
    ///
    /// Users removed while the listing is in progress are left out.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` when the provider call fails.
    async fn admin_list_users(&self, pool_id: &str) -> Result<Vec<UserRecord>, IdentityError>;

    /// # Errors
    ///
    /// Returns `UserNotFound` when the user does not exist.
    async fn admin_add_user_to_group(
        &self,
        pool_id: &str,
        username: &str,
        group: UserGroup,
    ) -> Result<(), IdentityError>;

    /// Resolve an access token to the username it was issued for
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for any token the provider does not accept, and
    /// `Unexpected` when the provider cannot be reached.
    async fn get_user(&self, access_token: &str) -> Result<String, IdentityError>;

    /// Names of the groups a user belongs to
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `Unexpected` when the lookup fails.
    async fn admin_list_groups_for_user(
        &self,
        pool_id: &str,
        username: &str,
    ) -> Result<Vec<String>, IdentityError>;

    /// # Errors
    ///
    /// Returns `DuplicateGroup` when the group already exists.
    async fn create_group(&self, pool_id: &str, group: UserGroup) -> Result<(), IdentityError>;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}
