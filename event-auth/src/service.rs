use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    LoginRequest, LoginResponse, SignupRequest, SignupResponse, Status, VerifyRequest,
    VerifyResponse,
};

/// Error type for authentication operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("JSON error: {0}")]
    JsonError(String),
    #[error("Server error: {0}")]
    ServerError(String),
    /// The server answered with `success: false`
    #[error("{0}")]
    Rejected(String),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(msg) | AuthError::Rejected(msg) => msg.clone(),
            AuthError::NetworkError(_) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            AuthError::JsonError(_) | AuthError::ServerError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

/// Connection settings for the auth endpoints
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

/// Login, signup and OTP verification against the events API
pub struct AuthService {
    base_url: String,
    client: reqwest::Client,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthServiceConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| AuthError::NetworkError(format!("Client build failed: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Logs in and returns the session token
    pub async fn login(&self, request: &LoginRequest) -> Result<String, AuthError> {
        request.validate()?;
        let response: LoginResponse = self.post("auth/login", request).await?;
        check_status(&response.status)?;
        non_empty(response.token, "token")
    }

    /// Creates an account and returns the user id to verify
    pub async fn signup(&self, request: &SignupRequest) -> Result<String, AuthError> {
        request.validate()?;
        let response: SignupResponse = self.post("auth/signup", request).await?;
        check_status(&response.status)?;
        non_empty(response.user_id, "user id")
    }

    /// Confirms the signup OTP and returns the session token
    pub async fn verify(&self, request: &VerifyRequest) -> Result<String, AuthError> {
        let response: VerifyResponse = self.post("auth/verify", request).await?;
        check_status(&response.status)?;
        non_empty(response.token, "token")
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, AuthError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Failed to read response: {}", e)))?;

        parse_response(status, &text)
    }
}

/// Decodes an API response body, turning error statuses into [`AuthError`]
pub fn parse_response<Resp: DeserializeOwned>(status: u16, body: &str) -> Result<Resp, AuthError> {
    if !(200..300).contains(&status) {
        log::warn!("Auth request failed with status {}", status);
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/status/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            });
        return Err(match message {
            Some(message) if (400..500).contains(&status) => AuthError::Rejected(message),
            _ => AuthError::ServerError(format!("Server returned status: {}", status)),
        });
    }

    serde_json::from_str(body)
        .map_err(|e| AuthError::JsonError(format!("Failed to parse response: {}", e)))
}

fn check_status(status: &Status) -> Result<(), AuthError> {
    if status.success {
        Ok(())
    } else {
        Err(AuthError::Rejected(
            status
                .message
                .clone()
                .unwrap_or_else(|| "Request was rejected".to_string()),
        ))
    }
}

fn non_empty(value: String, what: &str) -> Result<String, AuthError> {
    if value.is_empty() {
        Err(AuthError::ServerError(format!("Response contained no {}", what)))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let response: SignupResponse =
            parse_response(200, r#"{"status":{"success":true},"user_id":"u-9"}"#).unwrap();
        assert_eq!(response.user_id, "u-9");
        assert!(check_status(&response.status).is_ok());
    }

    #[test]
    fn test_rejected_envelope() {
        let response: LoginResponse = parse_response(
            200,
            r#"{"status":{"success":false,"message":"Wrong password"}}"#,
        )
        .unwrap();
        assert_eq!(
            check_status(&response.status),
            Err(AuthError::Rejected("Wrong password".to_string()))
        );
    }

    #[test]
    fn test_error_status_codes() {
        let err = parse_response::<LoginResponse>(
            401,
            r#"{"status":{"success":false,"message":"Invalid credentials"}}"#,
        )
        .unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid credentials".to_string()));
        assert_eq!(err.user_message(), "Invalid credentials");

        let err = parse_response::<LoginResponse>(500, "oops").unwrap_err();
        assert_eq!(
            err,
            AuthError::ServerError("Server returned status: 500".to_string())
        );
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_response::<VerifyResponse>(200, "{").unwrap_err();
        assert!(matches!(err, AuthError::JsonError(_)));
    }

    #[test]
    fn test_empty_token_is_an_error() {
        assert!(non_empty(String::new(), "token").is_err());
        assert_eq!(non_empty("t".to_string(), "token").unwrap(), "t");
    }
}
