pub mod code_generator;
pub mod hashing;
pub mod jwt;
pub mod otp_delivery;
pub mod rate_limit;
pub mod redis_cache;
pub mod security;
