use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum_test::{TestResponse, TestServer};
use std::sync::{Arc, Mutex};

use storefront_backend::modules::auth::memory::InMemoryUserRepository;
use storefront_backend::modules::otp::{
    attempts::InMemoryAttemptStore,
    interface::{DeliveryError, OtpSender},
    memory::InMemoryOtpRepository,
    model::OtpPolicy,
    OtpService,
};
use storefront_backend::services::{jwt::JwtService, rate_limit::create_rate_limiter};
use storefront_backend::AppState;

/// Captures codes instead of delivering them.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[allow(dead_code)]
impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpSender for RecordingSender {
    async fn send(&self, email: &str, code: &str, _expires_in_secs: i64) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Rejected(503));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub sender: Arc<RecordingSender>,
    pub users: Arc<InMemoryUserRepository>,
    pub otp_repo: Arc<InMemoryOtpRepository>,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        Self::build(Arc::new(RecordingSender::default()), 1000, false)
    }

    pub fn with_sender(sender: RecordingSender) -> Self {
        Self::build(Arc::new(sender), 1000, false)
    }

    /// Small burst, keyed on X-Forwarded-For as behind a trusted proxy.
    pub fn with_rate_limit(burst: u32) -> Self {
        Self::build(Arc::new(RecordingSender::default()), burst, true)
    }

    /// Small burst, no proxy in front: X-Forwarded-For is client-controlled.
    pub fn with_direct_rate_limit(burst: u32) -> Self {
        Self::build(Arc::new(RecordingSender::default()), burst, false)
    }

    fn build(sender: Arc<RecordingSender>, burst: u32, trust_forwarded_for: bool) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let otp_repo = Arc::new(InMemoryOtpRepository::new());

        let state = AppState {
            users: users.clone(),
            otp_service: OtpService::new(
                otp_repo.clone(),
                Arc::new(InMemoryAttemptStore::new()),
                OtpPolicy::default(),
            ),
            otp_sender: sender.clone(),
            jwt_service: JwtService::new("test-secret-key-for-testing-only".to_string()),
            secure_cookies: false,
            trust_forwarded_for,
        };

        let app = storefront_backend::create_app(state, create_rate_limiter(1, burst));
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            sender,
            users,
            otp_repo,
        }
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

/// Raw Set-Cookie header values of a response.
#[allow(dead_code)]
pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// The Set-Cookie header for `name`, if the response set one.
#[allow(dead_code)]
pub fn set_cookie_for(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}

/// `name=value` pair from a Set-Cookie header, ready for a Cookie header.
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().trim().to_string()
}

#[allow(dead_code)]
pub fn cookie_header(pairs: &[String]) -> HeaderValue {
    HeaderValue::from_str(&pairs.join("; ")).unwrap()
}

/// `consultant_referral=<value>` holding an arbitrary JSON document, the way
/// a client could hand-craft it.
#[allow(dead_code)]
pub fn crafted_referral_cookie(record: &serde_json::Value) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    format!("consultant_referral={}", URL_SAFE_NO_PAD.encode(record.to_string()))
}
