// Wire-level tests for the Cognito client against a local mock server
use std::time::Duration;

use actix_web::{test, web, App};
use scribe_auth::identity::sigv4::AwsCredentials;
use scribe_auth::models::auth::AuthenticationResult;
use scribe_auth::models::UserGroup;
use scribe_auth::state::{AppState, PoolConfig};
use scribe_auth::{configure_services, CognitoClient, IdentityError, IdentityProvider};
use std::sync::Arc;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POOL: &str = "us-east-1_WirePool";
const CLIENT: &str = "wire-client";

fn target(operation: &str) -> String {
    format!("AWSCognitoIdentityProviderService.{operation}")
}

fn client_for(server: &MockServer, secret: Option<&str>) -> CognitoClient {
    CognitoClient::new(
        &server.uri(),
        "us-east-1",
        AwsCredentials {
            access_key_id: "AKIDWIRETEST".to_string(),
            secret_access_key: "wire-secret".to_string(),
            session_token: Some("wire-session".to_string()),
        },
        secret.map(ToString::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn provider_error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "__type": code, "message": message }))
}

#[tokio::test]
async fn test_initiate_auth_sends_signed_request_and_parses_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminInitiateAuth").as_str()))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header("x-amz-security-token", "wire-session"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_partial_json(json!({
            "UserPoolId": POOL,
            "ClientId": CLIENT,
            "AuthFlow": "ADMIN_USER_PASSWORD_AUTH",
            "AuthParameters": { "USERNAME": "reader", "PASSWORD": "Passw0rd!" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .initiate_auth(POOL, CLIENT, "reader", "Passw0rd!")
        .await
        .unwrap();

    let AuthenticationResult::Tokens(tokens) = result else {
        panic!("expected tokens");
    };
    assert_eq!(tokens.access_token, "access");
    assert_eq!(tokens.expires_in, 3600);
}

#[tokio::test]
async fn test_secret_hash_is_sent_when_client_has_a_secret() {
    let server = MockServer::start().await;
    // base64(HMAC-SHA256("client-secret", "reader" + "wire-client"))
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminInitiateAuth").as_str()))
        .and(body_partial_json(json!({
            "AuthParameters": { "USERNAME": "reader" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": "opaque-session",
            "ChallengeParameters": {}
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, Some("client-secret"))
        .initiate_auth(POOL, CLIENT, "reader", "Temp1234!")
        .await
        .unwrap();
    assert!(result.is_challenge());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["AuthParameters"]["SECRET_HASH"],
        "+pyp8imnC5lfbe+QLERv2n0ZdkSoQ79t1zRYAeOJmJM="
    );
}

#[tokio::test]
async fn test_login_rejection_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminInitiateAuth").as_str()))
        .respond_with(provider_error(
            "NotAuthorizedException",
            "Incorrect username or password.",
        ))
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .initiate_auth(POOL, CLIENT, "reader", "wrong")
        .await;
    assert_eq!(
        result,
        Err(IdentityError::AuthFailure(
            "Incorrect username or password.".to_string()
        ))
    );
}

#[tokio::test]
async fn test_server_error_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .initiate_auth(POOL, CLIENT, "reader", "Passw0rd!")
        .await;
    assert!(matches!(result, Err(IdentityError::Unexpected(_))));
}

#[tokio::test]
async fn test_unsupported_challenge_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ChallengeName": "SMS_MFA",
            "Session": "s"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .initiate_auth(POOL, CLIENT, "reader", "Passw0rd!")
        .await;
    assert!(matches!(result, Err(IdentityError::Unexpected(msg)) if msg.contains("SMS_MFA")));
}

#[tokio::test]
async fn test_error_classification_per_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminCreateUser").as_str()))
        .respond_with(provider_error(
            "com.amazonaws.cognito#UsernameExistsException",
            "User account already exists",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminDeleteUser").as_str()))
        .respond_with(provider_error("UserNotFoundException", "User does not exist."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminAddUserToGroup").as_str()))
        .respond_with(provider_error(
            "ResourceNotFoundException",
            "Group not found.",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("CreateGroup").as_str()))
        .respond_with(provider_error("GroupExistsException", "exists"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetUser").as_str()))
        .respond_with(provider_error("NotAuthorizedException", "Invalid Access Token"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminRespondToAuthChallenge").as_str()))
        .respond_with(provider_error(
            "CodeMismatchException",
            "Invalid session for the user.",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    assert_eq!(
        client
            .admin_create_user(POOL, "dup", "dup@example.com", "Temp1234!")
            .await,
        Err(IdentityError::DuplicateUser(
            "User account already exists".to_string()
        ))
    );
    assert_eq!(
        client.admin_delete_user(POOL, "ghost").await,
        Err(IdentityError::UserNotFound("User does not exist.".to_string()))
    );
    assert!(matches!(
        client
            .admin_add_user_to_group(POOL, "someone", UserGroup::Users)
            .await,
        Err(IdentityError::Unexpected(_))
    ));
    assert_eq!(
        client.create_group(POOL, UserGroup::Admins).await,
        Err(IdentityError::DuplicateGroup("exists".to_string()))
    );
    assert!(matches!(
        client.get_user("forged").await,
        Err(IdentityError::Unauthorized(_))
    ));
    assert_eq!(
        client
            .respond_to_challenge(POOL, CLIENT, "reader", "stale", "Passw0rd!")
            .await,
        Err(IdentityError::ChallengeFailure(
            "Invalid session for the user.".to_string()
        ))
    );
}

#[tokio::test]
async fn test_list_users_follows_pagination_and_resolves_groups() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListUsers").as_str()))
        .and(body_partial_json(json!({ "PaginationToken": "page-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Users": [{
                "Username": "second",
                "Attributes": [{ "Name": "email", "Value": "second@example.com" }],
                "UserCreateDate": 1_700_000_100.5,
                "Enabled": false,
                "UserStatus": "FORCE_CHANGE_PASSWORD"
            }]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListUsers").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Users": [{
                "Username": "first",
                "Attributes": [
                    { "Name": "sub", "Value": "abc" },
                    { "Name": "email", "Value": "first@example.com" }
                ],
                "UserCreateDate": 1_700_000_000.0,
                "Enabled": true,
                "UserStatus": "CONFIRMED"
            }],
            "PaginationToken": "page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .and(body_partial_json(json!({ "Username": "first" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Groups": [{ "GroupName": "admins" }, { "GroupName": "users" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .and(body_partial_json(json!({ "Username": "second" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Groups": [] })))
        .mount(&server)
        .await;

    let users = client_for(&server, None).admin_list_users(POOL).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].username, "first");
    assert_eq!(users[0].email.as_deref(), Some("first@example.com"));
    assert!(users[0].is_member_of(UserGroup::Admins));
    assert!(users[0].is_member_of(UserGroup::Users));
    assert_eq!(users[0].user_create_date(), "2023-11-14T22:13:20.000Z");

    assert_eq!(users[1].username, "second");
    assert!(!users[1].enabled);
    assert!(users[1].groups.is_empty());
    assert_eq!(users[1].user_create_date(), "2023-11-14T22:15:00.500Z");
}

#[tokio::test]
async fn test_list_groups_follows_next_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .and(body_partial_json(json!({ "NextToken": "more" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Groups": [{ "GroupName": "users" }]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Groups": [{ "GroupName": "admins" }],
            "NextToken": "more"
        })))
        .mount(&server)
        .await;

    let groups = client_for(&server, None)
        .admin_list_groups_for_user(POOL, "someone")
        .await
        .unwrap();
    assert_eq!(groups, vec!["admins".to_string(), "users".to_string()]);
}

#[tokio::test]
async fn test_empty_success_body_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminDeleteUser").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, None)
        .admin_delete_user(POOL, "someone")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_challenge_answer_forwards_session_and_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminRespondToAuthChallenge").as_str()))
        .and(body_partial_json(json!({
            "UserPoolId": POOL,
            "ClientId": CLIENT,
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": "opaque/session+value==",
            "ChallengeResponses": {
                "USERNAME": "novice",
                "NEW_PASSWORD": "Chosen-Passw0rd!"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": {
                "AccessToken": "fresh-access",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .respond_to_challenge(
            POOL,
            CLIENT,
            "novice",
            "opaque/session+value==",
            "Chosen-Passw0rd!",
        )
        .await
        .unwrap();

    let AuthenticationResult::Tokens(tokens) = result else {
        panic!("expected tokens");
    };
    assert_eq!(tokens.access_token, "fresh-access");
}

#[tokio::test]
async fn test_challenge_answer_can_raise_another_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminRespondToAuthChallenge").as_str()))
        .and(body_partial_json(json!({
            "Session": "first-session",
            "ChallengeResponses": { "USERNAME": "novice" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": "second-session",
            "ChallengeParameters": {}
        })))
        .mount(&server)
        .await;

    let result = client_for(&server, None)
        .respond_to_challenge(POOL, CLIENT, "novice", "first-session", "Chosen-Passw0rd!")
        .await
        .unwrap();

    let AuthenticationResult::Challenge(challenge) = result else {
        panic!("expected a challenge");
    };
    assert_eq!(challenge.session, "second-session");
    assert_eq!(challenge.username, "novice");
}

#[tokio::test]
async fn test_get_user_outage_is_unexpected_not_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetUser").as_str()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server, None).get_user("valid-token").await;
    assert!(matches!(result, Err(IdentityError::Unexpected(_))));
}

#[actix_web::test]
async fn test_admin_route_during_provider_outage_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider: Arc<dyn IdentityProvider> = Arc::new(client_for(&server, None));
    let state = web::Data::new(AppState::new(
        provider,
        PoolConfig {
            user_pool_id: POOL.to_string(),
            client_id: CLIENT.to_string(),
        },
    ));
    let app = test::init_service(App::new().app_data(state).configure(configure_services)).await;

    let req = test::TestRequest::get()
        .uri("/auth/users")
        .insert_header(("Authorization", "Bearer tok"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 500);
    assert!(resp.headers().get("WWW-Authenticate").is_none());
}

#[tokio::test]
async fn test_list_users_skips_user_deleted_mid_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListUsers").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Users": [
                { "Username": "kept", "UserCreateDate": 1_700_000_000.0, "UserStatus": "CONFIRMED" },
                { "Username": "gone", "UserCreateDate": 1_700_000_000.0, "UserStatus": "CONFIRMED" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .and(body_partial_json(json!({ "Username": "kept" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Groups": [{ "GroupName": "users" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("AdminListGroupsForUser").as_str()))
        .and(body_partial_json(json!({ "Username": "gone" })))
        .respond_with(provider_error("UserNotFoundException", "User does not exist."))
        .mount(&server)
        .await;

    let users = client_for(&server, None).admin_list_users(POOL).await.unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["kept"]);
}
