//! First-run provisioning
//!
//! Ensures the `admins` and `users` groups exist and, when configured, that an
//! administrator account exists and belongs to `admins`. Safe to run on every
//! start: existing groups and users are left as they are.

use anyhow::{bail, Context, Result};
use log::info;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::UserGroup;
use crate::settings::BootstrapSettings;

/// What a bootstrap run changed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub groups_created: Vec<UserGroup>,
    pub admin_created: bool,
}

/// Provision groups and the configured administrator
///
/// # Errors
///
/// Returns an error if:
/// - An administrator is configured without a password
/// - Any provider call fails for a reason other than the resource existing
pub async fn ensure_groups_and_admin(
    provider: &dyn IdentityProvider,
    pool_id: &str,
    settings: &BootstrapSettings,
) -> Result<BootstrapReport> {
    let mut report = BootstrapReport::default();

    for group in UserGroup::ALL {
        match provider.create_group(pool_id, group).await {
            Ok(()) => {
                info!("Created group '{group}' with precedence {}", group.precedence());
                report.groups_created.push(group);
            }
            Err(IdentityError::DuplicateGroup(_)) => {
                info!("Group '{group}' already exists");
            }
            Err(e) => return Err(e).with_context(|| format!("failed to create group '{group}'")),
        }
    }

    let (Some(username), Some(email)) = (&settings.admin_username, &settings.admin_email) else {
        return Ok(report);
    };
    let Some(password) = settings.get_admin_password() else {
        bail!("bootstrap admin '{username}' is configured without a password");
    };

    match provider
        .admin_create_user(pool_id, username, email, &password)
        .await
    {
        Ok(_) => {
            info!("Created bootstrap admin '{username}'");
            report.admin_created = true;
        }
        Err(IdentityError::DuplicateUser(_)) => {
            info!("Bootstrap admin '{username}' already exists");
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to create bootstrap admin '{username}'"))
        }
    }

    provider
        .admin_add_user_to_group(pool_id, username, UserGroup::Admins)
        .await
        .with_context(|| format!("failed to add '{username}' to the admins group"))?;

    Ok(report)
}
