use event_auth::{
    AuthService, AuthToken, LoginRequest, SignupRequest, TokenStore, VerifyRequest,
};

use crate::config::AppConfig;
use crate::error::AppError;

/// Logs in and stores the session token
pub async fn login(
    config: &AppConfig,
    store: &dyn TokenStore,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let service = AuthService::new(config.auth_service_config())?;
    let token = service
        .login(&LoginRequest {
            email_id: email.trim().to_string(),
            password: password.to_string(),
        })
        .await?;

    store.set_token(&AuthToken { token })?;
    log::info!("Logged in as {}", email.trim());
    Ok(())
}

/// Creates an account; returns the user id the OTP must be verified for
pub async fn signup(
    config: &AppConfig,
    request: &SignupRequest,
) -> Result<String, AppError> {
    let service = AuthService::new(config.auth_service_config())?;
    let user_id = service.signup(request).await?;
    log::info!("Signed up {} as user {}", request.email_id, user_id);
    Ok(user_id)
}

/// Verifies the signup OTP and stores the session token
pub async fn verify(
    config: &AppConfig,
    store: &dyn TokenStore,
    user_id: &str,
    otp: &str,
) -> Result<(), AppError> {
    let request = VerifyRequest::parse(user_id, otp)?;
    let service = AuthService::new(config.auth_service_config())?;
    let token = service.verify(&request).await?;

    store.set_token(&AuthToken { token })?;
    log::info!("User {} verified", user_id);
    Ok(())
}

pub fn logout(store: &dyn TokenStore) -> Result<(), AppError> {
    store.remove_token()?;
    log::info!("Session token removed");
    Ok(())
}
