//! # Event Auth
//!
//! Authentication client for the events API.
//!
//! This crate provides:
//! - Login, signup and OTP verification requests with form-level validation
//! - Token storage behind the [`TokenStore`] trait (in memory or JSON file)
//!
//! ## Separation of Concerns
//!
//! This crate does **not** attach tokens to other API calls; the application
//! reads the stored token and hands it to whatever client needs it.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use event_auth::{AuthService, AuthToken, FileTokenStore, LoginRequest, TokenStore};
//!
//! let service = AuthService::new(config)?;
//! let token = service
//!     .login(&LoginRequest { email_id: "ana@example.com".into(), password: "secret123".into() })
//!     .await?;
//! FileTokenStore::new("storage.json").set_token(&AuthToken { token })?;
//! ```

pub mod models;
pub mod service;
pub mod token;

pub use models::{
    AuthToken, LoginRequest, LoginResponse, SignupRequest, SignupResponse, Status, VerifyRequest,
    VerifyResponse,
};
pub use service::{AuthError, AuthService, AuthServiceConfig};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, TOKEN_KEY};
