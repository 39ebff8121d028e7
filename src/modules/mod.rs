pub mod auth;
pub mod common;
pub mod otp;
pub mod referral;
