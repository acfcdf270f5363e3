//! In-memory identity provider
//!
//! Behaves like a user pool closely enough for handler and gate tests:
//! users flagged for a password change get a `NEW_PASSWORD_REQUIRED`
//! challenge, sessions are bound to the username they were issued for, and
//! every call is counted so tests can assert that rejected requests caused
//! no side effects.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::auth::{AuthenticationResult, ChallengeName, ChallengeState, TokenBundle};
use crate::models::{UserGroup, UserRecord};

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub initiate_auth: AtomicUsize,
    pub respond_to_challenge: AtomicUsize,
    pub admin_create_user: AtomicUsize,
    pub admin_delete_user: AtomicUsize,
    pub admin_list_users: AtomicUsize,
    pub admin_add_user_to_group: AtomicUsize,
    pub get_user: AtomicUsize,
    pub admin_list_groups_for_user: AtomicUsize,
    pub create_group: AtomicUsize,
}

impl CallCounts {
    /// Calls that change pool state
    #[must_use]
    pub fn mutating(&self) -> usize {
        [
            &self.admin_create_user,
            &self.admin_delete_user,
            &self.admin_add_user_to_group,
            &self.create_group,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.mutating()
            + [
                &self.initiate_auth,
                &self.respond_to_challenge,
                &self.admin_list_users,
                &self.get_user,
                &self.admin_list_groups_for_user,
            ]
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum::<usize>()
    }
}

#[derive(Debug, Clone)]
struct MockUser {
    record: UserRecord,
    password: String,
    must_change_password: bool,
}

impl MockUser {
    fn new(username: &str, email: &str, password: &str, groups: &[UserGroup]) -> Self {
        Self {
            record: UserRecord {
                username: username.to_string(),
                email: Some(email.to_string()),
                user_status: Some("CONFIRMED".to_string()),
                enabled: true,
                created_at: Utc::now(),
                groups: groups.iter().copied().collect(),
            },
            password: password.to_string(),
            must_change_password: false,
        }
    }

    fn pending(username: &str, email: &str, temporary_password: &str, groups: &[UserGroup]) -> Self {
        let mut user = Self::new(username, email, temporary_password, groups);
        user.must_change_password = true;
        user.record.user_status = Some("FORCE_CHANGE_PASSWORD".to_string());
        user
    }
}

#[derive(Debug, Default)]
struct PoolState {
    users: HashMap<String, MockUser>,
    groups: BTreeSet<UserGroup>,
    /// session -> username
    sessions: HashMap<String, String>,
    /// access token -> username
    access_tokens: HashMap<String, String>,
    next_id: u64,
}

impl PoolState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_tokens(&mut self, username: &str) -> TokenBundle {
        let access_token = format!("access-{username}-{}", self.next_id());
        self.access_tokens
            .insert(access_token.clone(), username.to_string());
        TokenBundle {
            access_token,
            id_token: Some(format!("id-{username}")),
            refresh_token: Some(format!("refresh-{username}")),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        }
    }

    fn issue_challenge(&mut self, username: &str) -> ChallengeState {
        let session = format!("session-{}", self.next_id());
        self.sessions.insert(session.clone(), username.to_string());
        ChallengeState {
            challenge_name: ChallengeName::NewPasswordRequired,
            session,
            username: username.to_string(),
        }
    }
}

/// Test double for [`IdentityProvider`]
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    state: Mutex<PoolState>,
    calls: CallCounts,
    /// operation name (or `*`) -> forced `Unexpected` message
    failures: Mutex<HashMap<String, String>>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Make every subsequent call fail with `Unexpected`
    pub fn fail_with(&self, message: &str) {
        self.fail_operation("*", message);
    }

    /// Make subsequent calls of one operation fail with `Unexpected`
    pub fn fail_operation(&self, operation: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), message.to_string());
    }

    /// Insert a confirmed user without touching the call counters
    pub fn seed_user(&self, username: &str, email: &str, password: &str, groups: &[UserGroup]) {
        let user = MockUser::new(username, email, password, groups);
        self.state
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), user);
    }

    /// Insert a user who must choose a new password at first login
    pub fn seed_pending_user(&self, username: &str, email: &str, temporary_password: &str) {
        let user = MockUser::pending(username, email, temporary_password, &[UserGroup::Users]);
        self.state
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), user);
    }

    /// Issue an access token for a seeded user without logging in
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist.
    #[must_use]
    pub fn access_token_for(&self, username: &str) -> String {
        let mut state = self.state.lock().unwrap();
        assert!(state.users.contains_key(username), "unknown user {username}");
        state.issue_tokens(username).access_token
    }

    #[must_use]
    pub fn has_user(&self, username: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(username)
    }

    #[must_use]
    pub fn user(&self, username: &str) -> Option<UserRecord> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|u| u.record.clone())
    }

    #[must_use]
    pub fn groups(&self) -> BTreeSet<UserGroup> {
        self.state.lock().unwrap().groups.clone()
    }

    fn check_failure(&self, operation: &str) -> Result<(), IdentityError> {
        let failures = self.failures.lock().unwrap();
        match failures.get(operation).or_else(|| failures.get("*")) {
            Some(message) => Err(IdentityError::Unexpected(message.clone())),
            None => Ok(()),
        }
    }

    fn count(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn initiate_auth(
        &self,
        _pool_id: &str,
        _client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, IdentityError> {
        Self::count(&self.calls.initiate_auth);
        self.check_failure("initiate_auth")?;

        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get(username)
            .filter(|u| u.password == password && u.record.enabled)
            .cloned()
            .ok_or_else(|| IdentityError::AuthFailure("Incorrect username or password.".into()))?;

        if user.must_change_password {
            return Ok(AuthenticationResult::Challenge(state.issue_challenge(username)));
        }
        Ok(AuthenticationResult::Tokens(state.issue_tokens(username)))
    }

    async fn respond_to_challenge(
        &self,
        _pool_id: &str,
        _client_id: &str,
        username: &str,
        session: &str,
        new_password: &str,
    ) -> Result<AuthenticationResult, IdentityError> {
        Self::count(&self.calls.respond_to_challenge);
        self.check_failure("respond_to_challenge")?;

        let mut state = self.state.lock().unwrap();
        match state.sessions.get(session) {
            Some(owner) if owner == username => {}
            _ => {
                return Err(IdentityError::ChallengeFailure(
                    "Invalid session for the user, session is expired.".into(),
                ))
            }
        }
        if new_password.len() < 8 {
            return Err(IdentityError::ChallengeFailure(
                "Password does not conform to policy: Password not long enough".into(),
            ));
        }

        state.sessions.remove(session);
        let user = state
            .users
            .get_mut(username)
            .ok_or_else(|| IdentityError::ChallengeFailure("User does not exist.".into()))?;
        user.password = new_password.to_string();
        user.must_change_password = false;
        user.record.user_status = Some("CONFIRMED".to_string());

        Ok(AuthenticationResult::Tokens(state.issue_tokens(username)))
    }

    async fn admin_create_user(
        &self,
        _pool_id: &str,
        username: &str,
        email: &str,
        temporary_password: &str,
    ) -> Result<UserRecord, IdentityError> {
        Self::count(&self.calls.admin_create_user);
        self.check_failure("admin_create_user")?;

        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(username) {
            return Err(IdentityError::DuplicateUser(
                "User account already exists".into(),
            ));
        }
        let user = MockUser::pending(username, email, temporary_password, &[]);
        let record = user.record.clone();
        state.users.insert(username.to_string(), user);
        Ok(record)
    }

    async fn admin_delete_user(&self, _pool_id: &str, username: &str) -> Result<(), IdentityError> {
        Self::count(&self.calls.admin_delete_user);
        self.check_failure("admin_delete_user")?;

        let mut state = self.state.lock().unwrap();
        state
            .users
            .remove(username)
            .ok_or_else(|| IdentityError::UserNotFound("User does not exist.".into()))?;
        state.access_tokens.retain(|_, owner| owner.as_str() != username);
        state.sessions.retain(|_, owner| owner.as_str() != username);
        Ok(())
    }

    async fn admin_list_users(&self, _pool_id: &str) -> Result<Vec<UserRecord>, IdentityError> {
        Self::count(&self.calls.admin_list_users);
        self.check_failure("admin_list_users")?;

        let state = self.state.lock().unwrap();
        let mut users: Vec<UserRecord> = state.users.values().map(|u| u.record.clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn admin_add_user_to_group(
        &self,
        _pool_id: &str,
        username: &str,
        group: UserGroup,
    ) -> Result<(), IdentityError> {
        Self::count(&self.calls.admin_add_user_to_group);
        self.check_failure("admin_add_user_to_group")?;

        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(username)
            .ok_or_else(|| IdentityError::UserNotFound("User does not exist.".into()))?;
        user.record.groups.insert(group);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<String, IdentityError> {
        Self::count(&self.calls.get_user);
        self.check_failure("get_user")?;

        self.state
            .lock()
            .unwrap()
            .access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdentityError::Unauthorized("Invalid Access Token".into()))
    }

    async fn admin_list_groups_for_user(
        &self,
        _pool_id: &str,
        username: &str,
    ) -> Result<Vec<String>, IdentityError> {
        Self::count(&self.calls.admin_list_groups_for_user);
        self.check_failure("admin_list_groups_for_user")?;

        let state = self.state.lock().unwrap();
        let user = state
            .users
            .get(username)
            .ok_or_else(|| IdentityError::UserNotFound("User does not exist.".into()))?;
        Ok(user
            .record
            .groups
            .iter()
            .map(|g| g.as_str().to_string())
            .collect())
    }

    async fn create_group(&self, _pool_id: &str, group: UserGroup) -> Result<(), IdentityError> {
        Self::count(&self.calls.create_group);
        self.check_failure("create_group")?;

        if self.state.lock().unwrap().groups.insert(group) {
            Ok(())
        } else {
            Err(IdentityError::DuplicateGroup(format!(
                "A group with the name {group} already exists."
            )))
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
