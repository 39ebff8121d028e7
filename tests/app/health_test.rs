use axum::http::{header, StatusCode};

use crate::common::TestContext;

#[tokio::test]
async fn health_reports_version() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/health").await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/").await;
    let headers = response.headers();

    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}
