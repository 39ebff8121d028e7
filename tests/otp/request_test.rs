use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_email, RecordingSender, TestContext};

#[tokio::test]
async fn request_sends_code_without_exposing_it() {
    let ctx = TestContext::new();
    let email = test_email();

    let response = ctx
        .server
        .post("/otp/request")
        .json(&json!({ "email": &email }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["expires_in"], 300);

    let code = ctx.sender.last_code_for(&email).expect("code should be delivered");
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert!(!response.text().contains(&code));
}

#[tokio::test]
async fn request_normalizes_email() {
    let ctx = TestContext::new();
    let email = test_email();

    ctx.server
        .post("/otp/request")
        .json(&json!({ "email": email.to_uppercase() }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    assert!(ctx.sender.last_code_for(&email).is_some());
    assert_eq!(ctx.otp_repo.records_for(&email).await.len(), 1);
}

#[tokio::test]
async fn request_rejects_invalid_email() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/otp/request")
        .json(&json!({ "email": "nope" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_email");
    assert_eq!(ctx.sender.count(), 0);
}

#[tokio::test]
async fn second_request_supersedes_first_code() {
    let ctx = TestContext::new();
    let email = test_email();

    ctx.server.post("/otp/request").json(&json!({ "email": &email })).await;
    let first = ctx.sender.last_code_for(&email).unwrap();

    ctx.server.post("/otp/request").json(&json!({ "email": &email })).await;
    let second = ctx.sender.last_code_for(&email).unwrap();

    let records = ctx.otp_repo.records_for(&email).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records.iter().filter(|r| !r.used).count(), 1);

    if first != second {
        ctx.server
            .post("/otp/verify")
            .json(&json!({ "email": &email, "code": first }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    ctx.server
        .post("/otp/verify")
        .json(&json!({ "email": &email, "code": second }))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn delivery_failure_is_reported() {
    let ctx = TestContext::with_sender(RecordingSender::failing());

    let response = ctx
        .server
        .post("/otp/request")
        .json(&json!({ "email": test_email() }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "delivery_failed");
}
