use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    interface::AuthError,
    schema::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    service,
};
use crate::modules::referral::resolve_attribution;
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    if let Err(e) = req.validate() {
        return Err(AuthError::Validation(e.to_string()));
    }

    if req.password != req.password_confirm {
        return Err(AuthError::Validation("Passwords do not match".to_string()));
    }

    let referred_by = resolve_attribution(&jar, state.secure_cookies);

    let user = service::register(state.users.as_ref(), &req.email, &req.password, referred_by).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: user.into() }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AuthError> {
    let tokens = service::login(
        state.users.as_ref(),
        &state.jwt_service,
        &req.email,
        &req.password,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer",
            expires_in: tokens.expires_in,
        }),
    ))
}
