use std::env;
use std::str::FromStr;

use crate::modules::otp::model::OtpPolicy;

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub production: bool,
    /// Set when a proxy in front of the service overwrites X-Forwarded-For
    pub trust_forwarded_for: bool,
    pub otp_delivery_url: Option<String>,
    pub otp_delivery_api_key: Option<String>,
    pub rate_limit_burst: u32,
    pub rate_limit_per_minute: u32,
    pub otp_policy: OtpPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let redis_url = optional("REDIS_URL");
        let bind_addr = optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let production = optional("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let trust_forwarded_for = parsed("TRUST_FORWARDED_FOR", false)?;

        let defaults = OtpPolicy::default();
        let otp_policy = OtpPolicy {
            code_length: parsed("OTP_CODE_LENGTH", defaults.code_length)?,
            expiration_secs: duration_secs(
                "OTP_EXPIRATION_SECS",
                parsed("OTP_EXPIRATION_SECS", defaults.expiration_secs)?,
            )?,
            max_attempts: parsed("OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
            lockout_secs: duration_secs(
                "OTP_LOCKOUT_SECS",
                parsed("OTP_LOCKOUT_SECS", defaults.lockout_secs)?,
            )?,
        };

        if otp_policy.code_length == 0 {
            return Err(ConfigError::Invalid {
                name: "OTP_CODE_LENGTH",
                reason: "must be greater than zero".to_string(),
            });
        }

        let rate_limit_burst = parsed("RATE_LIMIT_BURST", 20u32)?;
        let rate_limit_per_minute = parsed("RATE_LIMIT_PER_MINUTE", 10u32)?;
        if rate_limit_burst == 0 || rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_BURST",
                reason: "rate limits must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url,
            redis_url,
            jwt_secret,
            bind_addr,
            production,
            trust_forwarded_for,
            otp_delivery_url: optional("OTP_DELIVERY_URL"),
            otp_delivery_api_key: optional("OTP_DELIVERY_API_KEY"),
            rate_limit_burst,
            rate_limit_per_minute,
            otp_policy,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

// Blank values count as unset
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Longest OTP expiry or lockout accepted from the environment (30 days).
const MAX_DURATION_SECS: i64 = 30 * 24 * 60 * 60;

fn duration_secs(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_DURATION_SECS).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("must be between 1 and {} seconds", MAX_DURATION_SECS),
        })
    }
}
