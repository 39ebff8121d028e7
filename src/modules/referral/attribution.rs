use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use super::model::{is_valid_code, normalize_code, MIRROR_COOKIE};
use super::storage::ServerCookieStore;
use super::tracker::{extract_from_query, ReferralTracker};
use crate::modules::common::ErrorResponse;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("Invalid consultant code")]
    InvalidCode,
}

impl IntoResponse for ReferralError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_message("invalid_referral_code", self.to_string())),
        )
            .into_response()
    }
}

/// Consultant to credit for a conversion on this request.
///
/// The server cookie wins; the script-visible mirror is enough on its own.
pub fn resolve_attribution(jar: &CookieJar, secure: bool) -> Option<String> {
    let tracker = ReferralTracker::new(ServerCookieStore::new(jar.clone(), secure));
    if let Some(record) = tracker.read() {
        return Some(record.code);
    }

    jar.get(MIRROR_COOKIE)
        .map(|cookie| normalize_code(cookie.value()))
        .filter(|code| is_valid_code(code))
}

/// Captures `?ref=` on any request into the HTTP-only cookie.
pub async fn track_referral(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let code = request
        .uri()
        .query()
        .and_then(extract_from_query)
        .filter(|code| is_valid_code(code));

    let response = next.run(request).await;

    match code {
        Some(code) => {
            let mut tracker =
                ReferralTracker::new(ServerCookieStore::new(jar, state.secure_cookies));
            tracker.capture(&code, None);
            (tracker.into_store().into_jar(), response).into_response()
        }
        None => response,
    }
}
