use serde::{Deserialize, Serialize};

use super::model::TrackingRecord;

#[derive(Debug, Deserialize)]
pub struct CaptureReferralRequest {
    pub code: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReferralResponse {
    pub code: String,
    pub timestamp: i64,
    pub source: String,
}

impl From<TrackingRecord> for ReferralResponse {
    fn from(record: TrackingRecord) -> Self {
        Self {
            code: record.code,
            timestamp: record.timestamp,
            source: record.source,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReferralLinkQuery {
    pub base_url: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ReferralLinkResponse {
    pub url: String,
}
