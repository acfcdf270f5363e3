//! Authentication outcome types
//!
//! A login attempt produces exactly one of two shapes: a token bundle, or a
//! challenge that must be answered before tokens are issued. Both are normal
//! outcomes and are returned with HTTP 200; only the payload differs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Tokens issued by the identity provider after successful authentication
///
/// Serialized with the provider's own key names so clients written against
/// the user pool keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Challenges this API knows how to carry back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeName {
    #[serde(rename = "NEW_PASSWORD_REQUIRED")]
    NewPasswordRequired,
}

impl ChallengeName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeName::NewPasswordRequired => "NEW_PASSWORD_REQUIRED",
        }
    }

    /// Parse a provider challenge name, `None` for challenges we do not support
    #[must_use]
    pub fn from_provider(name: &str) -> Option<Self> {
        match name {
            "NEW_PASSWORD_REQUIRED" => Some(ChallengeName::NewPasswordRequired),
            _ => None,
        }
    }
}

impl fmt::Display for ChallengeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate login state: the caller must answer before receiving tokens
///
/// `session` is opaque. It is handed back to the provider untouched together
/// with the same `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeState {
    #[serde(rename = "ChallengeName")]
    pub challenge_name: ChallengeName,
    #[serde(rename = "Session")]
    pub session: String,
    pub username: String,
}

/// Result of `initiate_auth` / `respond_to_challenge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationResult {
    Tokens(TokenBundle),
    Challenge(ChallengeState),
}

impl AuthenticationResult {
    #[must_use]
    pub fn is_challenge(&self) -> bool {
        matches!(self, AuthenticationResult::Challenge(_))
    }

    /// Body returned by the `/auth/*` routes
    #[must_use]
    pub fn to_response_body(&self) -> Value {
        match self {
            AuthenticationResult::Tokens(tokens) => json!(tokens),
            AuthenticationResult::Challenge(challenge) => json!(challenge),
        }
    }

    /// Body returned by the legacy `/login` route
    ///
    /// That route never interpreted challenges; it relays the provider
    /// envelope as-is.
    #[must_use]
    pub fn to_provider_envelope(&self) -> Value {
        match self {
            AuthenticationResult::Tokens(tokens) => json!({
                "AuthenticationResult": tokens,
                "ChallengeParameters": {}
            }),
            AuthenticationResult::Challenge(challenge) => json!({
                "ChallengeName": challenge.challenge_name,
                "Session": challenge.session,
                "ChallengeParameters": {}
            }),
        }
    }
}
