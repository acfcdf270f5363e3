// Centralized logging for authentication events
//
// Usernames are logged; passwords, sessions and tokens never are.
use log::{error, info, warn};

use crate::identity::IdentityError;
use crate::models::auth::AuthenticationResult;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of a login attempt
    pub fn log_login_attempt(username: &str) {
        info!("Attempting to log in user: {username}");
    }

    /// Log the outcome of a login or challenge response
    pub fn log_authentication_outcome(username: &str, result: &AuthenticationResult) {
        match result {
            AuthenticationResult::Tokens(_) => {
                info!("User {username} logged in successfully.");
            }
            AuthenticationResult::Challenge(challenge) => {
                info!(
                    "User {username} must answer the {} challenge.",
                    challenge.challenge_name
                );
            }
        }
    }

    /// Log an administrative action before it is forwarded to the provider
    pub fn log_admin_action(admin: &str, action: &str) {
        info!("Admin user '{admin}' is {action}.");
    }

    /// Log a failure that is expected from the caller's point of view
    pub fn log_rejected(operation: &str, subject: &str, err: &IdentityError) {
        warn!("{operation} rejected for {subject}: {err}");
    }

    /// Log a failure whose detail is withheld from the caller
    pub fn log_unexpected(operation: &str, subject: &str, err: &IdentityError) {
        error!("{operation} failed for {subject}: {err}");
    }

    /// Log provider and pool at startup
    pub fn log_provider_configured(provider: &str, pool_id: &str) {
        info!("✅ Identity provider {provider} configured for user pool {pool_id}");
    }
}
