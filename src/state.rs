//! Shared application state
//!
//! Immutable after startup. Handlers receive it as `web::Data<AppState>`; the
//! identity provider is injected here rather than looked up globally.

use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::settings::ScribeSettings;

/// User pool coordinates forwarded with every adapter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub user_pool_id: String,
    pub client_id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn IdentityProvider>,
    pub pool: PoolConfig,
}

impl AppState {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, pool: PoolConfig) -> Self {
        Self { provider, pool }
    }

    #[must_use]
    pub fn from_settings(provider: Arc<dyn IdentityProvider>, settings: &ScribeSettings) -> Self {
        Self::new(
            provider,
            PoolConfig {
                user_pool_id: settings.cognito.user_pool_id.clone(),
                client_id: settings.cognito.user_pool_client_id.clone(),
            },
        )
    }
}
