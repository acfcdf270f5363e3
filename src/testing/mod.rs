//! Testing utilities for scribe-auth
//!
//! Compiled for unit tests and, behind the `testing` feature, for the
//! integration tests under `tests/`.
//!
//! - [`mock`] - In-memory identity provider with call counters
//! - [`fixtures`] - Application state and seeded users
//!
//! ```rust,ignore
//! use scribe_auth::testing::{fixtures::TestFixtures, constants::TEST_ADMIN_USERNAME};
//!
//! let provider = TestFixtures::seeded_provider();
//! let bearer = TestFixtures::bearer_for(&provider, TEST_ADMIN_USERNAME);
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::MockIdentityProvider;

/// Common test constants
pub mod constants {
    pub const TEST_POOL_ID: &str = "us-east-1_TestPool";
    pub const TEST_CLIENT_ID: &str = "test-client-id";

    pub const TEST_ADMIN_USERNAME: &str = "archivist";
    pub const TEST_ADMIN_EMAIL: &str = "archivist@example.com";
    pub const TEST_ADMIN_PASSWORD: &str = "Adm1nPassw0rd!";

    pub const TEST_USER_USERNAME: &str = "apprentice";
    pub const TEST_USER_EMAIL: &str = "apprentice@example.com";
    pub const TEST_USER_PASSWORD: &str = "Us3rPassw0rd!";
}
