#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the scribe-auth application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authorization;
pub mod bootstrap;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod settings;
pub mod state;
pub mod utils;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authorization::AdminIdentity;
pub use handlers::configure_services;
pub use identity::{CognitoClient, IdentityError, IdentityProvider};
pub use settings::ScribeSettings;
pub use state::AppState;
pub use utils::ApiError;
