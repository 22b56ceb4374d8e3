use serde::{Deserialize, Serialize};

use crate::service::AuthError;

/// Minimum password length accepted by the signup and login forms
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Status envelope carried by every API response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email_id: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        validate_email(&self.email_id)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: Status,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.first_name.trim().is_empty() {
            return Err(AuthError::Validation("First name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(AuthError::Validation("Last name is required".to_string()));
        }
        validate_email(&self.email_id)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    pub status: Status,
    #[serde(default)]
    pub user_id: String,
}

/// One-time password check after signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyRequest {
    pub user_id: String,
    pub otp: u32,
}

impl VerifyRequest {
    /// Builds the request from the OTP as typed by the user
    pub fn parse(user_id: impl Into<String>, otp: &str) -> Result<Self, AuthError> {
        let otp = otp
            .trim()
            .parse::<u32>()
            .map_err(|_| AuthError::Validation("OTP must be numeric".to_string()))?;
        Ok(Self {
            user_id: user_id.into(),
            otp,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub status: Status,
    #[serde(default)]
    pub token: String,
}

/// Value stored under the token key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::Validation("Email is required".to_string()));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("Email is invalid".to_string()))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    if password.chars().count() <= MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be longer than {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
