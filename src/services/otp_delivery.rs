use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::modules::otp::interface::{DeliveryError, OtpSender};

/// Posts verification codes to a hosted email/notification API.
pub struct HttpOtpSender {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeliveryPayload<'a> {
    to: &'a str,
    template: &'static str,
    code: &'a str,
    expires_in_minutes: i64,
}

impl HttpOtpSender {
    pub fn new(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl OtpSender for HttpOtpSender {
    async fn send(&self, email: &str, code: &str, expires_in_secs: i64) -> Result<(), DeliveryError> {
        let payload = DeliveryPayload {
            to: email,
            template: "verification_code",
            code,
            expires_in_minutes: (expires_in_secs + 59) / 60,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeliveryError::Rejected(response.status().as_u16()));
        }

        tracing::debug!("Verification code handed to delivery service for {}", email);
        Ok(())
    }
}

/// Development sender: writes the code to the log instead of delivering it.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, code: &str, expires_in_secs: i64) -> Result<(), DeliveryError> {
        tracing::warn!(
            "No OTP delivery configured; code for {} is {} (valid {}s)",
            email,
            code,
            expires_in_secs
        );
        Ok(())
    }
}
