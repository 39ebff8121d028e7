use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::modules::common::ErrorResponse;
use crate::modules::referral::{
    attribution::ReferralError,
    model::{is_valid_code, normalize_code},
    schema::{CaptureReferralRequest, ReferralLinkQuery, ReferralLinkResponse, ReferralResponse},
    storage::ServerCookieStore,
    tracker::{build_url, ReferralTracker},
};
use crate::AppState;

pub async fn current(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<ReferralResponse>, (StatusCode, Json<ErrorResponse>)> {
    let tracker = ReferralTracker::new(ServerCookieStore::new(jar, state.secure_cookies));

    match tracker.read() {
        Some(record) => Ok(Json(record.into())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no_referral")),
        )),
    }
}

pub async fn capture(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<CaptureReferralRequest>,
) -> Result<(CookieJar, Json<ReferralResponse>), ReferralError> {
    let code = normalize_code(&req.code);
    if !is_valid_code(&code) {
        return Err(ReferralError::InvalidCode);
    }

    let source = req
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut tracker = ReferralTracker::new(ServerCookieStore::new(jar, state.secure_cookies));
    let record = tracker.capture(&code, source);

    Ok((tracker.into_store().into_jar(), Json(record.into())))
}

pub async fn remove(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut tracker = ReferralTracker::new(ServerCookieStore::new(jar, state.secure_cookies));
    tracker.remove();

    (tracker.into_store().into_jar(), StatusCode::NO_CONTENT)
}

pub async fn link(
    Query(query): Query<ReferralLinkQuery>,
) -> Result<Json<ReferralLinkResponse>, ReferralError> {
    if !is_valid_code(&normalize_code(&query.code)) {
        return Err(ReferralError::InvalidCode);
    }

    Ok(Json(ReferralLinkResponse {
        url: build_url(&query.base_url, &query.code),
    }))
}
