use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// REQUEST CODE
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub message: &'static str,
    pub expires_in: i64,
}

// =============================================================================
// VERIFY CODE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub verified: bool,
}
