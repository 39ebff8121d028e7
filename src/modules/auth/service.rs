use chrono::Utc;
use uuid::Uuid;

use super::interface::{AuthError, Result, TokenPair, UserRepository};
use super::model::User;
use crate::modules::common::normalize_email;
use crate::services::{hashing, jwt::JwtService};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub async fn register(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    referred_by: Option<String>,
) -> Result<User> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let email = normalize_email(email);
    if users.email_exists(&email).await? {
        return Err(AuthError::EmailAlreadyExists);
    }

    let password_hash =
        hashing::hash_password(password).map_err(|e| AuthError::Internal(e.to_string()))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        email_verified: false,
        referred_by,
        created_at: now,
        updated_at: now,
    };

    users.create(&user).await?;

    match &user.referred_by {
        Some(code) => tracing::info!("Registered {} referred by {}", user.email, code),
        None => tracing::info!("Registered {}", user.email),
    }

    Ok(user)
}

pub async fn login(
    users: &dyn UserRepository,
    jwt_service: &JwtService,
    email: &str,
    password: &str,
) -> Result<TokenPair> {
    let user = users
        .find_by_email(&normalize_email(email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let is_valid = hashing::verify_password(password, &user.password_hash)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    if !is_valid {
        return Err(AuthError::InvalidCredentials);
    }

    let access_token = jwt_service
        .create_access_token(&user.id, &user.email)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let refresh_token = jwt_service
        .create_refresh_token(&user.id)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: jwt_service.get_access_token_duration_secs(),
    })
}
