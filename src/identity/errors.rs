//! Identity adapter error kinds
//!
//! Every failure coming back from the identity provider is folded into one of
//! these variants by the adapter, so handlers match on a closed set instead of
//! inspecting provider exception names.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// Credentials rejected by the provider
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// Challenge answer rejected: bad or expired session, mismatched user, or password policy
    #[error("challenge response failed: {0}")]
    ChallengeFailure(String),

    #[error("user already exists: {0}")]
    DuplicateUser(String),

    #[error("group already exists: {0}")]
    DuplicateGroup(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Bearer credential missing, malformed or not accepted by the provider
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Anything else, including transport failures
    #[error("unexpected identity provider error: {0}")]
    Unexpected(String),
}

impl IdentityError {
    /// Upstream detail without the variant prefix
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            IdentityError::AuthFailure(msg)
            | IdentityError::ChallengeFailure(msg)
            | IdentityError::DuplicateUser(msg)
            | IdentityError::DuplicateGroup(msg)
            | IdentityError::UserNotFound(msg)
            | IdentityError::Unauthorized(msg)
            | IdentityError::Unexpected(msg) => msg,
        }
    }
}
