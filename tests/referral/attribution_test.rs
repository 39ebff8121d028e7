use axum::http::{header, StatusCode};
use serde_json::json;

use crate::common::{
    cookie_header, cookie_pair, crafted_referral_cookie, set_cookie_for, test_email, test_password,
    TestContext,
};

async fn register_with_cookies(ctx: &TestContext, cookies: Vec<String>) -> serde_json::Value {
    let mut request = ctx.server.post("/auth/register").json(&json!({
        "email": test_email(),
        "password": test_password(),
        "password_confirm": test_password()
    }));

    if !cookies.is_empty() {
        request = request.add_header(header::COOKIE, cookie_header(&cookies));
    }

    let response = request.await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn landing_with_ref_then_signup_credits_consultant() {
    let ctx = TestContext::new();

    // Visitor lands on a referral link
    let landing = ctx.server.get("/").add_query_param("ref", "anna01").await;
    let cookie = cookie_pair(&set_cookie_for(&landing, "consultant_referral").unwrap());

    let body = register_with_cookies(&ctx, vec![cookie]).await;
    assert_eq!(body["user"]["referred_by"], "ANNA01");
}

#[tokio::test]
async fn server_cookie_wins_over_mirror() {
    let ctx = TestContext::new();

    let capture = ctx
        .server
        .post("/referral")
        .json(&json!({ "code": "server1" }))
        .await;
    let cookie = cookie_pair(&set_cookie_for(&capture, "consultant_referral").unwrap());

    let body = register_with_cookies(&ctx, vec![cookie, "consultant_ref=MIRROR1".to_string()]).await;
    assert_eq!(body["user"]["referred_by"], "SERVER1");
}

#[tokio::test]
async fn signup_without_referral_has_no_consultant() {
    let ctx = TestContext::new();

    let body = register_with_cookies(&ctx, Vec::new()).await;
    assert!(body["user"]["referred_by"].is_null());
}

#[tokio::test]
async fn ref_on_signup_request_is_captured_for_later_requests() {
    let ctx = TestContext::new();

    // Attribution reads the cookies the request arrived with
    let response = ctx
        .server
        .post("/auth/register")
        .add_query_param("ref", "late1")
        .json(&json!({
            "email": test_email(),
            "password": test_password(),
            "password_confirm": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert!(set_cookie_for(&response, "consultant_referral").is_some());

    let body: serde_json::Value = response.json();
    assert!(body["user"]["referred_by"].is_null());
}

#[tokio::test]
async fn crafted_server_cookie_does_not_attribute() {
    let ctx = TestContext::new();

    let cookie = crafted_referral_cookie(&json!({
        "code": format!("not valid; {}", "x".repeat(40)),
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "source": "x"
    }));

    let body = register_with_cookies(&ctx, vec![cookie]).await;
    assert!(body["user"]["referred_by"].is_null());
}

#[tokio::test]
async fn crafted_timestamp_does_not_attribute() {
    let ctx = TestContext::new();

    for timestamp in [i64::MIN, i64::MAX] {
        let cookie = crafted_referral_cookie(&json!({
            "code": "ANNA01",
            "timestamp": timestamp,
            "source": "x"
        }));

        let body = register_with_cookies(&ctx, vec![cookie]).await;
        assert!(body["user"]["referred_by"].is_null());
    }
}
