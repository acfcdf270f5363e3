use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub mod auth;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// The two groups a pool user can belong to
///
/// Ordered by precedence: `Admins` wins over `Users` when a user is in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserGroup {
    Admins,
    Users,
}

impl UserGroup {
    pub const ALL: [UserGroup; 2] = [UserGroup::Admins, UserGroup::Users];

    /// Group name as stored in the user pool
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserGroup::Admins => "admins",
            UserGroup::Users => "users",
        }
    }

    /// Precedence value used when the group is created in the pool
    #[must_use]
    pub fn precedence(self) -> i32 {
        match self {
            UserGroup::Admins => 1,
            UserGroup::Users => 2,
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            UserGroup::Admins => "Group for Arcane Scribe administrators",
            UserGroup::Users => "Group for Arcane Scribe users",
        }
    }
}

impl fmt::Display for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admins" => Ok(UserGroup::Admins),
            "users" => Ok(UserGroup::Users),
            other => Err(format!("unknown user group: {other}")),
        }
    }
}

/// A user as reported by the identity provider
///
/// Never cached; every handler reads it fresh through the identity adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub email: Option<String>,
    pub user_status: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub groups: BTreeSet<UserGroup>,
}

impl UserRecord {
    /// Creation timestamp in the format returned to API callers
    #[must_use]
    pub fn user_create_date(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    #[must_use]
    pub fn is_member_of(&self, group: UserGroup) -> bool {
        self.groups.contains(&group)
    }
}

/// Entry of the admin user listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub user_status: String,
    pub enabled: bool,
    pub user_create_date: String,
    pub groups: Vec<UserGroup>,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        Self {
            username: record.username.clone(),
            email: record.email.clone().unwrap_or_default(),
            user_status: record.user_status.clone().unwrap_or_default(),
            enabled: record.enabled,
            user_create_date: record.user_create_date(),
            groups: record.groups.iter().copied().collect(),
        }
    }
}
