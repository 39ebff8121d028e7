use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

use super::model::{
    TrackingRecord, LOCAL_STORAGE_KEY, MIRROR_COOKIE, REFERRAL_MAX_AGE_MS, SERVER_COOKIE,
};
use super::tracker::TrackingStore;

fn max_age() -> Duration {
    Duration::milliseconds(REFERRAL_MAX_AGE_MS)
}

// Already-past expiry so the agent drops the cookie right away
fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

// =============================================================================
// SERVER: HTTP-ONLY COOKIE
// =============================================================================

/// Server-side copy kept in an HTTP-only cookie.
///
/// The JSON record is base64url-encoded so it survives as a cookie value.
/// Changes accumulate in the jar; return it from the handler to emit them.
pub struct ServerCookieStore {
    jar: CookieJar,
    secure: bool,
}

impl ServerCookieStore {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl TrackingStore for ServerCookieStore {
    fn load_raw(&self) -> Option<String> {
        let cookie = self.jar.get(SERVER_COOKIE)?;
        let bytes = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn save(&mut self, record: &TrackingRecord) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Could not encode referral record: {}", e);
                return;
            }
        };

        let cookie = Cookie::build((SERVER_COOKIE, URL_SAFE_NO_PAD.encode(json)))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(max_age());

        self.jar = self.jar.clone().add(cookie);
    }

    fn clear(&mut self) {
        self.jar = self
            .jar
            .clone()
            .add(expired(SERVER_COOKIE))
            .add(expired(MIRROR_COOKIE));
    }
}

// =============================================================================
// BROWSER: LOCAL STORAGE + MIRRORED COOKIE
// =============================================================================

/// Minimal Web Storage surface.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Client-side copy: the JSON record in local storage, and the bare code in a
/// script-visible cookie so server requests carry it without an extra call.
pub struct BrowserStore<L> {
    local: L,
    cookies: CookieJar,
}

impl<L: LocalStorage> BrowserStore<L> {
    pub fn new(local: L, cookies: CookieJar) -> Self {
        Self { local, cookies }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

impl<L: LocalStorage> TrackingStore for BrowserStore<L> {
    fn load_raw(&self) -> Option<String> {
        self.local.get_item(LOCAL_STORAGE_KEY)
    }

    fn save(&mut self, record: &TrackingRecord) {
        if let Ok(json) = serde_json::to_string(record) {
            self.local.set_item(LOCAL_STORAGE_KEY, json);
        }

        let mirror = Cookie::build((MIRROR_COOKIE, record.code.clone()))
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age());
        self.cookies = self.cookies.clone().add(mirror);
    }

    fn clear(&mut self) {
        self.local.remove_item(LOCAL_STORAGE_KEY);
        self.cookies = self.cookies.clone().add(expired(MIRROR_COOKIE));
    }
}
