//! Cognito user pool client
//!
//! Talks to the `AWSCognitoIdentityProviderService` JSON 1.1 API directly with
//! `reqwest`, signing each call with SigV4. Provider errors are classified per
//! operation into [`IdentityError`] so callers never see Cognito exception
//! names.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::identity::sigv4::{hmac_sha256, AwsCredentials, RequestSigner};
use crate::identity::{IdentityError, IdentityProvider};
use crate::models::auth::{AuthenticationResult, ChallengeName, ChallengeState, TokenBundle};
use crate::models::{UserGroup, UserRecord};
use crate::settings::ScribeSettings;

const SERVICE: &str = "cognito-idp";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const AUTH_FLOW: &str = "ADMIN_USER_PASSWORD_AUTH";

/// Why a single API call failed, before per-operation classification
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallFailure {
    /// The service answered with a client error (`__type` + message)
    Provider { code: String, message: String },
    /// Network failure, server error, or an unreadable response
    Transport(String),
}

impl CallFailure {
    fn message(&self) -> String {
        match self {
            CallFailure::Provider { code, message } => format!("{code}: {message}"),
            CallFailure::Transport(msg) => msg.clone(),
        }
    }

    /// Any client error becomes `kind`, everything else is unexpected
    fn provider_or_unexpected(self, kind: fn(String) -> IdentityError) -> IdentityError {
        match self {
            CallFailure::Provider { message, .. } => kind(message),
            CallFailure::Transport(msg) => IdentityError::Unexpected(msg),
        }
    }

    /// Only `code` becomes `kind`, everything else is unexpected
    fn code_or_unexpected(self, expected: &str, kind: fn(String) -> IdentityError) -> IdentityError {
        match self {
            CallFailure::Provider { code, message } if code == expected => kind(message),
            other => IdentityError::Unexpected(other.message()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    challenge_name: Option<String>,
    session: Option<String>,
    authentication_result: Option<TokenBundle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CognitoUser {
    username: String,
    #[serde(default)]
    attributes: Vec<AttributeType>,
    user_create_date: Option<f64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    user_status: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AdminCreateUserResponse {
    user: CognitoUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListUsersResponse {
    #[serde(default)]
    users: Vec<CognitoUser>,
    pagination_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupType {
    group_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListGroupsForUserResponse {
    #[serde(default)]
    groups: Vec<GroupType>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
}

impl CognitoUser {
    #[allow(clippy::cast_possible_truncation)]
    fn into_record(self, groups: BTreeSet<UserGroup>) -> UserRecord {
        let email = self
            .attributes
            .iter()
            .find(|attr| attr.name == "email")
            .and_then(|attr| attr.value.clone());
        let created_at = self
            .user_create_date
            .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0).round() as i64))
            .unwrap_or_default();

        UserRecord {
            username: self.username,
            email,
            user_status: self.user_status,
            enabled: self.enabled,
            created_at,
            groups,
        }
    }
}

/// Production [`IdentityProvider`] backed by a Cognito user pool
pub struct CognitoClient {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    signer: RequestSigner,
    client_secret: Option<String>,
}

impl CognitoClient {
    /// Build a client from the loaded settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The region cannot be determined
    /// - AWS credentials are missing
    /// - The endpoint URL is invalid
    pub fn from_settings(settings: &ScribeSettings) -> Result<Self, String> {
        let region = settings
            .cognito
            .region()
            .ok_or_else(|| "Cannot determine the Cognito region".to_string())?;
        let endpoint = settings
            .cognito
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{SERVICE}.{region}.amazonaws.com/"));

        let credentials = AwsCredentials {
            access_key_id: settings
                .aws
                .access_key_id
                .clone()
                .ok_or_else(|| "AWS_ACCESS_KEY_ID is not configured".to_string())?,
            secret_access_key: settings
                .aws
                .secret_access_key
                .clone()
                .ok_or_else(|| "AWS_SECRET_ACCESS_KEY is not configured".to_string())?,
            session_token: settings.aws.session_token.clone(),
        };

        Self::new(
            &endpoint,
            &region,
            credentials,
            settings.cognito.user_pool_client_secret.clone(),
            Duration::from_secs(settings.cognito.timeout_seconds),
        )
    }

    /// # Errors
    ///
    /// Returns an error if the endpoint is not an absolute URL with a host,
    /// or the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        region: &str,
        credentials: AwsCredentials,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, String> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| format!("Invalid Cognito endpoint {endpoint}: {e}"))?;
        let host = endpoint
            .host_str()
            .ok_or_else(|| format!("Cognito endpoint {endpoint} has no host"))?;
        let host = match endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            host,
            endpoint,
            signer: RequestSigner::new(credentials, region, SERVICE),
            client_secret,
        })
    }

    /// `SECRET_HASH` parameter for app clients configured with a secret
    fn secret_hash(&self, username: &str, client_id: &str) -> Option<String> {
        self.client_secret.as_ref().map(|secret| {
            let digest = hmac_sha256(secret.as_bytes(), format!("{username}{client_id}").as_bytes());
            general_purpose::STANDARD.encode(digest)
        })
    }

    /// Perform one signed API call
    async fn call<T: DeserializeOwned>(&self, operation: &str, body: &Value) -> Result<T, CallFailure> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| CallFailure::Transport(format!("Failed to encode {operation} request: {e}")))?;
        let target = format!("{TARGET_PREFIX}.{operation}");

        let signed = self.signer.sign(
            "POST",
            &self.host,
            self.endpoint.path(),
            &[("content-type", JSON_CONTENT_TYPE), ("x-amz-target", &target)],
            &payload,
            Utc::now(),
        );

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header(AUTHORIZATION, &signed.authorization)
            .body(payload);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        debug!("Calling Cognito {operation}");
        let response = request
            .send()
            .await
            .map_err(|e| CallFailure::Transport(format!("{operation} request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CallFailure::Transport(format!("Failed to read {operation} response: {e}")))?;

        if status.is_success() {
            let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
            return serde_json::from_str(text).map_err(|e| {
                CallFailure::Transport(format!("Failed to parse {operation} response: {e}"))
            });
        }

        if status.is_client_error() {
            let failure = parse_error_body(&text).unwrap_or_else(|| CallFailure::Provider {
                code: "UnknownError".to_string(),
                message: format!("{operation} rejected with status {status}"),
            });
            debug!("Cognito {operation} rejected: {}", failure.message());
            return Err(failure);
        }

        warn!("Cognito {operation} failed with status {status}");
        Err(CallFailure::Transport(format!(
            "{operation} failed with status {status}"
        )))
    }

    fn into_authentication_result(
        response: InitiateAuthResponse,
        username: &str,
    ) -> Result<AuthenticationResult, IdentityError> {
        if let Some(name) = response.challenge_name {
            let challenge_name = ChallengeName::from_provider(&name).ok_or_else(|| {
                IdentityError::Unexpected(format!("Unsupported authentication challenge: {name}"))
            })?;
            let session = response
                .session
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    IdentityError::Unexpected(format!("Challenge {name} carried no session"))
                })?;
            return Ok(AuthenticationResult::Challenge(ChallengeState {
                challenge_name,
                session,
                username: username.to_string(),
            }));
        }

        response
            .authentication_result
            .map(AuthenticationResult::Tokens)
            .ok_or_else(|| {
                IdentityError::Unexpected(
                    "Response carried neither tokens nor a challenge".to_string(),
                )
            })
    }

    async fn user_groups(&self, pool_id: &str, username: &str) -> Result<BTreeSet<UserGroup>, IdentityError> {
        Ok(self
            .admin_list_groups_for_user(pool_id, username)
            .await?
            .iter()
            .filter_map(|name| name.parse::<UserGroup>().ok())
            .collect())
    }
}

fn parse_error_body(text: &str) -> Option<CallFailure> {
    let body: ErrorBody = serde_json::from_str(text).ok()?;
    if body.error_type.is_empty() {
        return None;
    }
    // `__type` may be namespaced: "com.amazonaws...#NotAuthorizedException"
    let code = body
        .error_type
        .rsplit('#')
        .next()
        .unwrap_or(&body.error_type)
        .to_string();
    Some(CallFailure::Provider {
        code,
        message: body.message,
    })
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn initiate_auth(
        &self,
        pool_id: &str,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, IdentityError> {
        let mut auth_parameters = json!({
            "USERNAME": username,
            "PASSWORD": password,
        });
        if let Some(hash) = self.secret_hash(username, client_id) {
            auth_parameters["SECRET_HASH"] = Value::String(hash);
        }

        let response: InitiateAuthResponse = self
            .call(
                "AdminInitiateAuth",
                &json!({
                    "UserPoolId": pool_id,
                    "ClientId": client_id,
                    "AuthFlow": AUTH_FLOW,
                    "AuthParameters": auth_parameters,
                }),
            )
            .await
            .map_err(|f| f.provider_or_unexpected(IdentityError::AuthFailure))?;

        Self::into_authentication_result(response, username)
    }

    async fn respond_to_challenge(
        &self,
        pool_id: &str,
        client_id: &str,
        username: &str,
        session: &str,
        new_password: &str,
    ) -> Result<AuthenticationResult, IdentityError> {
        let mut challenge_responses = json!({
            "USERNAME": username,
            "NEW_PASSWORD": new_password,
        });
        if let Some(hash) = self.secret_hash(username, client_id) {
            challenge_responses["SECRET_HASH"] = Value::String(hash);
        }

        let response: InitiateAuthResponse = self
            .call(
                "AdminRespondToAuthChallenge",
                &json!({
                    "UserPoolId": pool_id,
                    "ClientId": client_id,
                    "ChallengeName": ChallengeName::NewPasswordRequired.as_str(),
                    "Session": session,
                    "ChallengeResponses": challenge_responses,
                }),
            )
            .await
            .map_err(|f| f.provider_or_unexpected(IdentityError::ChallengeFailure))?;

        Self::into_authentication_result(response, username)
    }

    async fn admin_create_user(
        &self,
        pool_id: &str,
        username: &str,
        email: &str,
        temporary_password: &str,
    ) -> Result<UserRecord, IdentityError> {
        let response: AdminCreateUserResponse = self
            .call(
                "AdminCreateUser",
                &json!({
                    "UserPoolId": pool_id,
                    "Username": username,
                    "TemporaryPassword": temporary_password,
                    "UserAttributes": [
                        { "Name": "email", "Value": email },
                        { "Name": "email_verified", "Value": "true" }
                    ],
                }),
            )
            .await
            .map_err(|f| f.code_or_unexpected("UsernameExistsException", IdentityError::DuplicateUser))?;

        Ok(response.user.into_record(BTreeSet::new()))
    }

    async fn admin_delete_user(&self, pool_id: &str, username: &str) -> Result<(), IdentityError> {
        let _: Value = self
            .call(
                "AdminDeleteUser",
                &json!({ "UserPoolId": pool_id, "Username": username }),
            )
            .await
            .map_err(|f| f.code_or_unexpected("UserNotFoundException", IdentityError::UserNotFound))?;
        Ok(())
    }

    async fn admin_list_users(&self, pool_id: &str) -> Result<Vec<UserRecord>, IdentityError> {
        let mut users = Vec::new();
        let mut pagination_token: Option<String> = None;

        loop {
            let mut request = json!({ "UserPoolId": pool_id });
            if let Some(token) = &pagination_token {
                request["PaginationToken"] = Value::String(token.clone());
            }

            let page: ListUsersResponse = self
                .call("ListUsers", &request)
                .await
                .map_err(|f| IdentityError::Unexpected(f.message()))?;

            for user in page.users {
                match self.user_groups(pool_id, &user.username).await {
                    Ok(groups) => users.push(user.into_record(groups)),
                    // Deleted between the listing and the group lookup
                    Err(IdentityError::UserNotFound(_)) => {
                        debug!("Skipping user '{}' removed during listing", user.username);
                    }
                    Err(e) => return Err(e),
                }
            }

            match page.pagination_token {
                Some(token) if !token.is_empty() => pagination_token = Some(token),
                _ => break,
            }
        }

        Ok(users)
    }

    async fn admin_add_user_to_group(
        &self,
        pool_id: &str,
        username: &str,
        group: UserGroup,
    ) -> Result<(), IdentityError> {
        let _: Value = self
            .call(
                "AdminAddUserToGroup",
                &json!({
                    "UserPoolId": pool_id,
                    "Username": username,
                    "GroupName": group.as_str(),
                }),
            )
            .await
            .map_err(|f| f.code_or_unexpected("UserNotFoundException", IdentityError::UserNotFound))?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<String, IdentityError> {
        let response: GetUserResponse = self
            .call("GetUser", &json!({ "AccessToken": access_token }))
            .await
            .map_err(|f| f.provider_or_unexpected(IdentityError::Unauthorized))?;
        Ok(response.username)
    }

    async fn admin_list_groups_for_user(
        &self,
        pool_id: &str,
        username: &str,
    ) -> Result<Vec<String>, IdentityError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = json!({ "UserPoolId": pool_id, "Username": username });
            if let Some(token) = &next_token {
                request["NextToken"] = Value::String(token.clone());
            }

            let page: ListGroupsForUserResponse = self
                .call("AdminListGroupsForUser", &request)
                .await
                .map_err(|f| f.code_or_unexpected("UserNotFoundException", IdentityError::UserNotFound))?;
            groups.extend(page.groups.into_iter().map(|g| g.group_name));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(groups)
    }

    async fn create_group(&self, pool_id: &str, group: UserGroup) -> Result<(), IdentityError> {
        let _: Value = self
            .call(
                "CreateGroup",
                &json!({
                    "UserPoolId": pool_id,
                    "GroupName": group.as_str(),
                    "Description": group.description(),
                    "Precedence": group.precedence(),
                }),
            )
            .await
            .map_err(|f| f.code_or_unexpected("GroupExistsException", IdentityError::DuplicateGroup))?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cognito"
    }
}
