pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use modules::auth::{auth_routes, interface::UserRepository};
use modules::otp::{interface::OtpSender, otp_routes, OtpService};
use modules::referral::{referral_routes, track_referral};
use services::jwt::JwtService;
use services::rate_limit::{ClientRateLimiter, RateLimitLayer};
use services::security::security_headers;

/// Everything handlers need, composed once at startup.
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub otp_service: OtpService,
    pub otp_sender: Arc<dyn OtpSender>,
    pub jwt_service: JwtService,
    /// Mark tracking cookies `Secure` (production only)
    pub secure_cookies: bool,
    /// Key rate limits on X-Forwarded-For (only behind a trusted proxy)
    pub trust_forwarded_for: bool,
}

pub fn create_app(state: AppState, rate_limiter: ClientRateLimiter) -> Router {
    let state = Arc::new(state);
    let trust_forwarded_for = state.trust_forwarded_for;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/otp", otp_routes())
        .nest("/referral", referral_routes())
        .layer(middleware::from_fn_with_state(state.clone(), track_referral))
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter, trust_forwarded_for))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Storefront API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
