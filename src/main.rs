use std::{net::SocketAddr, sync::Arc, time::Duration};

use storefront_backend::config::{environment::Config, init_db};
use storefront_backend::modules::auth::crud::UserCrud;
use storefront_backend::modules::otp::{
    attempts::{InMemoryAttemptStore, RedisAttemptStore},
    crud::OtpCrud,
    interface::{AttemptStore, OtpSender},
    OtpService,
};
use storefront_backend::services::{
    jwt::JwtService,
    otp_delivery::{HttpOtpSender, LogOtpSender},
    rate_limit::{create_rate_limiter, spawn_pruning},
    redis_cache::RedisService,
};
use storefront_backend::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing configuration is fatal before anything is built
    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to MySQL");
    tracing::info!("Connected to MySQL");

    let attempts: Arc<dyn AttemptStore> = match &config.redis_url {
        Some(url) => {
            let redis = RedisService::new(url).expect("Invalid REDIS_URL");
            tracing::info!("Using Redis for OTP attempt tracking");
            Arc::new(RedisAttemptStore::new(redis))
        }
        None => {
            tracing::warn!("REDIS_URL not set, OTP lockouts are tracked per process");
            Arc::new(InMemoryAttemptStore::new())
        }
    };

    let otp_sender: Arc<dyn OtpSender> = match &config.otp_delivery_url {
        Some(url) => Arc::new(HttpOtpSender::new(
            reqwest::Client::new(),
            url.clone(),
            config.otp_delivery_api_key.clone(),
        )),
        None => {
            tracing::warn!("OTP_DELIVERY_URL not set, verification codes are only logged");
            Arc::new(LogOtpSender)
        }
    };

    let state = AppState {
        users: Arc::new(UserCrud::new(db.clone())),
        otp_service: OtpService::new(Arc::new(OtpCrud::new(db)), attempts, config.otp_policy),
        otp_sender,
        jwt_service: JwtService::new(config.jwt_secret.clone()),
        secure_cookies: config.production,
        trust_forwarded_for: config.trust_forwarded_for,
    };

    let rate_limiter = create_rate_limiter(config.rate_limit_per_minute, config.rate_limit_burst);
    spawn_pruning(rate_limiter.clone(), Duration::from_secs(60));

    let app = storefront_backend::create_app(state, rate_limiter);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
