use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

async fn register(ctx: &TestContext, email: &str) {
    ctx.server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn login_returns_bearer_tokens() {
    let ctx = TestContext::new();
    let email = test_email();
    register(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let ctx = TestContext::new();
    let email = test_email();
    register(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": email.to_uppercase(),
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn login_with_wrong_password_and_unknown_email_look_the_same() {
    let ctx = TestContext::new();
    let email = test_email();
    register(&ctx, &email).await;

    let wrong_password = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": "WrongPassword123!"
        }))
        .await;

    let unknown_email = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": test_email(),
            "password": test_password()
        }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);

    let a: serde_json::Value = wrong_password.json();
    let b: serde_json::Value = unknown_email.json();
    assert_eq!(a, b);
}
