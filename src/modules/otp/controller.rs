use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::modules::common::normalize_email;
use crate::modules::otp::{
    interface::OtpError,
    schema::{RequestOtpRequest, RequestOtpResponse, VerifyOtpRequest, VerifyOtpResponse},
};
use crate::AppState;

pub async fn request_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestOtpRequest>,
) -> Result<(StatusCode, Json<RequestOtpResponse>), Response> {
    if req.validate().is_err() {
        return Err(OtpError::InvalidEmail.into_response());
    }

    let record = state
        .otp_service
        .issue(&req.email)
        .await
        .map_err(IntoResponse::into_response)?;

    let expires_in = (record.expires_at - record.created_at).num_seconds();

    state
        .otp_sender
        .send(&record.email, &record.code, expires_in)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RequestOtpResponse {
            message: "Verification code sent",
            expires_in,
        }),
    ))
}

pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpError> {
    state.otp_service.verify(&req.email, &req.code).await?;

    // The code is already consumed; a failed flag update is not the caller's problem
    let email = normalize_email(&req.email);
    match state.users.set_email_verified(&email).await {
        Ok(true) => tracing::info!("Email verified for account {}", email),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to flag {} as verified: {}", email, e),
    }

    Ok(Json(VerifyOtpResponse { verified: true }))
}
