use chrono::Utc;
use url::{form_urlencoded, Url};

use super::model::{normalize_code, TrackingRecord, REF_PARAM};

/// Backing medium for a tracking record.
///
/// Stores own their encoding. `load_raw` hands back the JSON document the
/// tracker parses, or `None` when nothing usable is stored.
pub trait TrackingStore {
    fn load_raw(&self) -> Option<String>;
    fn save(&mut self, record: &TrackingRecord);
    fn clear(&mut self);
}

/// Capture, read and remove a consultant referral on one storage medium.
///
/// Server and browser trackers are independent; nothing reconciles them.
pub struct ReferralTracker<S> {
    store: S,
}

impl<S: TrackingStore> ReferralTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn capture(&mut self, code: &str, source: Option<&str>) -> TrackingRecord {
        self.capture_at(code, source, Utc::now().timestamp_millis())
    }

    pub fn capture_at(&mut self, code: &str, source: Option<&str>, now_ms: i64) -> TrackingRecord {
        let record = TrackingRecord::new(code, source, now_ms);
        self.store.save(&record);
        tracing::debug!("Captured referral {} from {}", record.code, record.source);
        record
    }

    pub fn read(&self) -> Option<TrackingRecord> {
        self.read_at(Utc::now().timestamp_millis())
    }

    pub fn read_at(&self, now_ms: i64) -> Option<TrackingRecord> {
        let raw = self.store.load_raw()?;
        TrackingRecord::parse(&raw).filter(|record| !record.is_expired_at(now_ms))
    }

    pub fn remove(&mut self) {
        self.store.clear();
    }
}

/// `ref` parameter of an absolute URL, upper-cased.
pub fn extract_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query().and_then(extract_from_query)
}

/// `ref` parameter of a raw query string (without the leading `?`).
pub fn extract_from_query(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REF_PARAM)
        .map(|(_, value)| normalize_code(&value))
        .filter(|code| !code.is_empty())
}

/// `base_url` with `ref=<CODE>` set. Unparsable input comes back unchanged.
pub fn build_url(base_url: &str, code: &str) -> String {
    let mut url = match Url::parse(base_url) {
        Ok(url) => url,
        Err(_) => return base_url.to_string(),
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != REF_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(REF_PARAM, &normalize_code(code));

    url.to_string()
}
