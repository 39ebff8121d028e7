use axum::http::StatusCode;
use serde_json::json;
use storefront_backend::modules::auth::interface::UserRepository;

use crate::common::{test_email, test_password, TestContext};

async fn issue(ctx: &TestContext, email: &str) -> String {
    ctx.server
        .post("/otp/request")
        .json(&json!({ "email": email }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    ctx.sender.last_code_for(email).unwrap()
}

#[tokio::test]
async fn valid_code_verifies_once() {
    let ctx = TestContext::new();
    let email = test_email();
    let code = issue(&ctx, &email).await;

    let first = ctx
        .server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": &code }))
        .await;

    first.assert_status(StatusCode::OK);
    let body: serde_json::Value = first.json();
    assert_eq!(body["verified"], true);

    let second = ctx
        .server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": &code }))
        .await;

    second.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = second.json();
    assert_eq!(body["error"], "invalid_or_expired");
}

#[tokio::test]
async fn failures_do_not_reveal_why() {
    let ctx = TestContext::new();
    let email = test_email();
    let code = issue(&ctx, &email).await;

    let wrong_code = ctx
        .server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": "ZZZZZZZZ" }))
        .await;

    let never_issued = ctx
        .server
        .post("/otp/verify")
        .json(&json!({ "email": test_email(), "code": &code }))
        .await;

    wrong_code.assert_status(StatusCode::BAD_REQUEST);
    never_issued.assert_status(StatusCode::BAD_REQUEST);

    let a: serde_json::Value = wrong_code.json();
    let b: serde_json::Value = never_issued.json();
    assert_eq!(a, b);
}

#[tokio::test]
async fn repeated_failures_lock_the_email() {
    let ctx = TestContext::new();
    let email = test_email();
    let code = issue(&ctx, &email).await;

    for _ in 0..2 {
        ctx.server
            .post("/otp/verify")
            .json(&json!({ "email": &email, "code": "WRONG123" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    ctx.server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": "WRONG123" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Even the right code is refused during the lockout
    let locked = ctx
        .server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": &code }))
        .await;

    locked.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = locked.json();
    assert_eq!(body["error"], "too_many_attempts");

    ctx.server
        .post("/otp/request")
        .json(&json!({ "email": &email }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn verification_marks_existing_account_verified() {
    let ctx = TestContext::new();
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let code = issue(&ctx, &email).await;

    ctx.server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": code.to_lowercase() }))
        .await
        .assert_status(StatusCode::OK);

    let user = ctx.users.find_by_email(&email).await.unwrap().unwrap();
    assert!(user.email_verified);
}

#[tokio::test]
async fn verification_without_account_still_succeeds() {
    let ctx = TestContext::new();
    let email = test_email();
    let code = issue(&ctx, &email).await;

    ctx.server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": &code }))
        .await
        .assert_status(StatusCode::OK);

    assert!(ctx.users.find_by_email(&email).await.unwrap().is_none());
}
