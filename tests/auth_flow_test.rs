// Integration tests for the login and challenge-response routes
use actix_web::{test, App};
use scribe_auth::configure_services;
use scribe_auth::testing::constants::{
    TEST_ADMIN_PASSWORD, TEST_ADMIN_USERNAME, TEST_USER_EMAIL, TEST_USER_PASSWORD,
    TEST_USER_USERNAME,
};
use scribe_auth::testing::{MockIdentityProvider, TestFixtures};
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! app_for {
    ($provider:expr) => {
        test::init_service(
            App::new()
                .app_data(TestFixtures::app_state($provider))
                .configure(configure_services),
        )
        .await
    };
}

fn login_request(uri: &str, username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .set_json(json!({ "username": username, "password": password }))
}

fn pending_provider() -> Arc<MockIdentityProvider> {
    let provider = TestFixtures::seeded_provider();
    provider.seed_pending_user("novice", "novice@example.com", "Temp1234!");
    provider
}

#[actix_web::test]
async fn test_valid_credentials_return_tokens_not_challenge() {
    let provider = TestFixtures::seeded_provider();
    let app = app_for!(&provider);

    let req = login_request("/auth/login", TEST_USER_USERNAME, TEST_USER_PASSWORD).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["AccessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["TokenType"], "Bearer");
    assert!(body.get("ChallengeName").is_none());
}

#[actix_web::test]
async fn test_wrong_password_is_401_with_bearer_challenge() {
    let provider = TestFixtures::seeded_provider();
    let app = app_for!(&provider);

    let req = login_request("/auth/login", TEST_USER_USERNAME, "wrong-password").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers().get("WWW-Authenticate").unwrap(), "Bearer");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Incorrect username or password: Incorrect username or password."
    );
}

#[actix_web::test]
async fn test_unknown_user_is_401() {
    let provider = TestFixtures::seeded_provider();
    let app = app_for!(&provider);

    let req = login_request("/auth/login", "ghost", "whatever").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_new_password_challenge_then_tokens() {
    let provider = pending_provider();
    let app = app_for!(&provider);

    let req = login_request("/auth/login", "novice", "Temp1234!").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let challenge: Value = test::read_body_json(resp).await;
    assert_eq!(challenge["ChallengeName"], "NEW_PASSWORD_REQUIRED");
    assert_eq!(challenge["username"], "novice");
    let session = challenge["Session"].as_str().unwrap().to_string();
    assert!(!session.is_empty());

    let req = test::TestRequest::post()
        .uri("/auth/respond-to-challenge")
        .set_json(json!({
            "username": "novice",
            "session": session,
            "new_password": "Chosen-Passw0rd!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let tokens: Value = test::read_body_json(resp).await;
    assert!(tokens["AccessToken"].is_string());

    // The new password now logs in directly
    let req = login_request("/auth/login", "novice", "Chosen-Passw0rd!").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["AccessToken"].is_string());
}

#[actix_web::test]
async fn test_challenge_session_for_another_user_is_rejected() {
    let provider = pending_provider();
    provider.seed_pending_user("other", "other@example.com", "Temp1234!");
    let app = app_for!(&provider);

    let req = login_request("/auth/login", "novice", "Temp1234!").to_request();
    let challenge: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/auth/respond-to-challenge")
        .set_json(json!({
            "username": "other",
            "session": challenge["Session"],
            "new_password": "Chosen-Passw0rd!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("Invalid session"));
}

#[actix_web::test]
async fn test_fabricated_session_is_rejected() {
    let provider = pending_provider();
    let app = app_for!(&provider);

    let req = test::TestRequest::post()
        .uri("/auth/respond-to-challenge")
        .set_json(json!({
            "username": "novice",
            "session": "never-issued",
            "new_password": "Chosen-Passw0rd!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_missing_fields_are_422_without_provider_calls() {
    let provider = TestFixtures::seeded_provider();
    let app = app_for!(&provider);

    for (uri, body) in [
        ("/auth/login", json!({ "username": TEST_USER_USERNAME })),
        ("/auth/login", json!({ "username": "", "password": "x" })),
        ("/auth/respond-to-challenge", json!({ "username": "u", "session": "s" })),
        ("/login", json!({ "password": "x" })),
    ] {
        let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422, "{uri}");
    }
    assert_eq!(provider.calls().total(), 0);
}

#[actix_web::test]
async fn test_legacy_login_relays_provider_envelope() {
    let provider = pending_provider();
    let app = app_for!(&provider);

    let req = login_request("/login", TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["AuthenticationResult"]["AccessToken"].is_string());
    assert_eq!(body["ChallengeParameters"], json!({}));

    let req = login_request("/login", "novice", "Temp1234!").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ChallengeName"], "NEW_PASSWORD_REQUIRED");
    assert!(body["Session"].is_string());
    assert!(body.get("AuthenticationResult").is_none());

    let req = login_request("/login", TEST_USER_EMAIL, "nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
