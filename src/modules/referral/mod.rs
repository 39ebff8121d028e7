pub mod attribution;
pub mod controller;
pub mod model;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod tracker;

pub use attribution::{resolve_attribution, track_referral};
pub use routes::referral_routes;
pub use tracker::{build_url, extract_from_url, ReferralTracker, TrackingStore};
