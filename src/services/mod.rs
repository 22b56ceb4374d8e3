pub mod auth_service;
pub mod checkin_service;
pub mod session;

pub use auth_service::*;
pub use checkin_service::*;
pub use session::TokenSession;
