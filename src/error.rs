use checkin_photos::{CheckinError, PickerError};
use event_auth::{AuthError, TokenStoreError};

use crate::config::ConfigError;

/// Central error type for the check-in app
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),
    #[error("Check-in error: {0}")]
    Checkin(#[from] CheckinError),
    #[error("Photo selection error: {0}")]
    Picker(#[from] PickerError),
    /// No session token stored
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("{0}")]
    Other(String),
}

/// User-friendly error messages for the terminal
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => format!("Please check your configuration: {}", e),
            AppError::Auth(e) => e.user_message(),
            AppError::TokenStore(_) => {
                "Could not access the saved session. Please log in again.".to_string()
            }
            AppError::Checkin(e) => e.user_message(),
            AppError::Picker(e) => e.to_string(),
            AppError::NotLoggedIn => "Please log in first.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
