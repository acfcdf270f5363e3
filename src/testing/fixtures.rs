//! Pre-built test objects
//!
//! Wires a [`MockIdentityProvider`] into application state the same way
//! `main` wires the Cognito client, so handler tests exercise the real routes.

use std::sync::Arc;

use actix_web::web;

use crate::models::UserGroup;
use crate::settings::{CognitoSettings, ScribeSettings};
use crate::state::{AppState, PoolConfig};

use super::constants::{
    TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, TEST_ADMIN_USERNAME, TEST_CLIENT_ID, TEST_POOL_ID,
    TEST_USER_EMAIL, TEST_USER_PASSWORD, TEST_USER_USERNAME,
};
use super::mock::MockIdentityProvider;

/// Central fixture provider for test data
pub struct TestFixtures;

impl TestFixtures {
    #[must_use]
    pub fn pool() -> PoolConfig {
        PoolConfig {
            user_pool_id: TEST_POOL_ID.to_string(),
            client_id: TEST_CLIENT_ID.to_string(),
        }
    }

    /// Settings pointing at the test pool
    #[must_use]
    pub fn settings() -> ScribeSettings {
        ScribeSettings {
            cognito: CognitoSettings {
                user_pool_id: TEST_POOL_ID.to_string(),
                user_pool_client_id: TEST_CLIENT_ID.to_string(),
                ..CognitoSettings::default()
            },
            ..ScribeSettings::default()
        }
    }

    /// Mock pool with one confirmed admin and one confirmed regular user
    #[must_use]
    pub fn seeded_provider() -> Arc<MockIdentityProvider> {
        let provider = MockIdentityProvider::new();
        provider.seed_user(
            TEST_ADMIN_USERNAME,
            TEST_ADMIN_EMAIL,
            TEST_ADMIN_PASSWORD,
            &[UserGroup::Admins],
        );
        provider.seed_user(
            TEST_USER_USERNAME,
            TEST_USER_EMAIL,
            TEST_USER_PASSWORD,
            &[UserGroup::Users],
        );
        Arc::new(provider)
    }

    /// Application state backed by the given mock
    #[must_use]
    pub fn app_state(provider: &Arc<MockIdentityProvider>) -> web::Data<AppState> {
        web::Data::new(AppState::new(provider.clone(), Self::pool()))
    }

    /// `Authorization` header value for a freshly issued token
    #[must_use]
    pub fn bearer_for(provider: &MockIdentityProvider, username: &str) -> String {
        format!("Bearer {}", provider.access_token_for(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_provider_has_admin_and_user() {
        let provider = TestFixtures::seeded_provider();
        let admin = provider.user(TEST_ADMIN_USERNAME).unwrap();
        assert!(admin.is_member_of(UserGroup::Admins));
        let user = provider.user(TEST_USER_USERNAME).unwrap();
        assert!(!user.is_member_of(UserGroup::Admins));
        assert_eq!(provider.calls().total(), 0);
    }

    #[test]
    fn test_state_uses_test_pool() {
        let state = TestFixtures::app_state(&TestFixtures::seeded_provider());
        assert_eq!(state.pool, TestFixtures::pool());
        assert_eq!(TestFixtures::settings().cognito.user_pool_id, TEST_POOL_ID);
    }
}
