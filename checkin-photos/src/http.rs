//! REST implementation of the upload and check-in creation channels.
//!
//! Photos go to `POST {base}/photo` as multipart form data (`event_id` plus a
//! binary `file` part) and come back as `{ "status": {..}, "name": ".." }`.
//! Check-ins go to `POST {base}/event/{event_id}/checkin` as JSON.
//!
//! Every request carries the bearer token from the [`CredentialProvider`].
//! Without a token no request is sent and the call fails as unauthenticated.
//! Responses are mapped onto [`UploadError`] / [`CreationError`] here, so no
//! untyped JSON reaches the registry or the controller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::channel::{CheckinCreationChannel, UploadChannel, UploadRequest};
use crate::error::{CreationError, UploadError, UploadResult};
use crate::models::{CheckinReceipt, CheckinRequest, EventId, RemoteId};
use crate::picker::path_from_uri;

/// Supplies the bearer credential for API calls
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Connection settings for the events API
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("rha-checkin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Status envelope carried by every API response
#[derive(Debug, Deserialize)]
struct Status {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUploadResponse {
    status: Status,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateCheckinResponse {
    status: Status,
    #[serde(default)]
    checkin_id: String,
}

#[derive(Clone)]
pub struct HttpCheckinApi {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpCheckinApi {
    pub fn new(
        config: HttpApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// `{base}/event/{event_id}/checkin` with the event id escaped as one path segment
pub fn checkin_url(base_url: &str, event_id: &EventId) -> Result<reqwest::Url, CreationError> {
    let invalid = |reason: String| CreationError::Transport(format!("Invalid API url: {}", reason));

    let mut url = reqwest::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(base_url.to_string()))?
        .pop_if_empty()
        .extend(["event", event_id.as_str(), "checkin"]);
    Ok(url)
}

impl UploadChannel for HttpCheckinApi {
    fn upload(&self, request: UploadRequest) -> BoxFuture<'static, UploadResult<RemoteId>> {
        let client = self.client.clone();
        let url = self.endpoint("photo");
        let token = self.credentials.bearer_token();

        async move {
            let token = token.ok_or(UploadError::Unauthenticated)?;

            let path = path_from_uri(&request.file_uri);
            let data = tokio::fs::read(&path).await.map_err(|e| {
                UploadError::Transport(format!("Failed to read {}: {}", path.display(), e))
            })?;

            let file_name = request
                .display_name
                .clone()
                .or_else(|| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "photo.jpg".to_string());

            let mut part = Part::bytes(data).file_name(file_name);
            if let Some(mime) = &request.mime_type {
                part = part.mime_str(mime).map_err(|e| {
                    UploadError::Transport(format!("Invalid mime type {}: {}", mime, e))
                })?;
            }
            let form = Form::new()
                .text("event_id", request.event_id.to_string())
                .part("file", part);

            let response = client
                .post(&url)
                .bearer_auth(token)
                .multipart(form)
                .send()
                .await
                .map_err(|e| UploadError::Transport(format!("Request failed: {}", e)))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| UploadError::Transport(format!("Failed to read response: {}", e)))?;

            let result = interpret_upload(status, &body);
            match &result {
                Ok(name) => log::info!("Uploaded {} as {}", request.file_uri, name),
                Err(e) => log::warn!("Upload of {} failed: {}", request.file_uri, e),
            }
            result
        }
        .boxed()
    }
}

impl CheckinCreationChannel for HttpCheckinApi {
    fn create(
        &self,
        request: CheckinRequest,
    ) -> BoxFuture<'static, Result<CheckinReceipt, CreationError>> {
        let client = self.client.clone();
        let url = checkin_url(&self.base_url, &request.event_id);
        let token = self.credentials.bearer_token();

        async move {
            let token = token.ok_or(CreationError::Unauthenticated)?;
            let url = url?;

            let response = client
                .post(url)
                .bearer_auth(token)
                .json(&request)
                .send()
                .await
                .map_err(|e| CreationError::Transport(format!("Request failed: {}", e)))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| CreationError::Transport(format!("Failed to read response: {}", e)))?;

            interpret_creation(status, &body)
        }
        .boxed()
    }
}

/// Maps a photo upload response onto a committed identifier
pub fn interpret_upload(status: u16, body: &str) -> UploadResult<RemoteId> {
    match status {
        401 | 403 => return Err(UploadError::Unauthenticated),
        200..=299 => {}
        _ => {
            let message = server_message(body)
                .unwrap_or_else(|| format!("Server returned status: {}", status));
            return Err(UploadError::ServerRejected(message));
        }
    }

    let response: PhotoUploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::ServerRejected(format!("Failed to parse response: {}", e)))?;

    if !response.status.success {
        return Err(UploadError::ServerRejected(
            response
                .status
                .message
                .unwrap_or_else(|| "Upload rejected".to_string()),
        ));
    }

    RemoteId::new(response.name)
        .ok_or_else(|| UploadError::ServerRejected("Server returned no file name".to_string()))
}

/// Maps a check-in creation response onto a receipt
pub fn interpret_creation(status: u16, body: &str) -> Result<CheckinReceipt, CreationError> {
    match status {
        401 | 403 => return Err(CreationError::Unauthenticated),
        200..=299 => {}
        400..=499 => {
            return Err(CreationError::Validation(
                server_message(body).unwrap_or_else(|| format!("Request rejected ({})", status)),
            ))
        }
        _ => {
            return Err(CreationError::Transport(format!(
                "Server returned status: {}",
                status
            )))
        }
    }

    let response: CreateCheckinResponse = serde_json::from_str(body)
        .map_err(|e| CreationError::Transport(format!("Failed to parse response: {}", e)))?;

    if !response.status.success {
        return Err(CreationError::Validation(
            response
                .status
                .message
                .unwrap_or_else(|| "Check-in rejected".to_string()),
        ));
    }

    Ok(CheckinReceipt {
        checkin_id: response.checkin_id,
    })
}

/// Pulls a human readable message out of an error body, if there is one
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/status/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
