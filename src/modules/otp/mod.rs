pub mod attempts;
pub mod controller;
pub mod crud;
pub mod interface;
pub mod memory;
pub mod model;
pub mod routes;
pub mod schema;
pub mod service;

pub use routes::otp_routes;
pub use service::OtpService;
