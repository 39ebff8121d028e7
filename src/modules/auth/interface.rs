use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::model::User;
use crate::modules::common::ErrorResponse;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn email_exists(&self, email: &str) -> Result<bool>;
    /// Returns false when no account uses `email`.
    async fn set_email_verified(&self, email: &str) -> Result<bool>;
}

// =============================================================================
// SERVICE RESULT TYPES
// =============================================================================

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("{0}")]
    Validation(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Auth failure: {}", self);
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
