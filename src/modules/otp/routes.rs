use axum::{routing::post, Router};
use std::sync::Arc;

use crate::AppState;
use super::controller;

pub fn otp_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/request", post(controller::request_code))
        .route("/verify", post(controller::verify_code))
}
