use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;
use super::controller;

pub fn referral_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(controller::current)
                .post(controller::capture)
                .delete(controller::remove),
        )
        .route("/link", get(controller::link))
}
