//! Boundaries to the backend.
//!
//! The core only talks to the network through these two traits. The
//! production implementation lives in [`crate::http`]; tests use in-memory
//! doubles.

use futures::future::BoxFuture;

use crate::error::{CreationError, UploadResult};
use crate::models::{CheckinReceipt, CheckinRequest, EventId, RemoteId};

/// Everything the backend needs to accept one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub event_id: EventId,
    pub file_uri: String,
    pub mime_type: Option<String>,
    pub display_name: Option<String>,
}

/// Uploads one photo and yields the committed server identifier.
///
/// Implementations must not retry internally; one call is one attempt.
pub trait UploadChannel: Send + Sync {
    fn upload(&self, request: UploadRequest) -> BoxFuture<'static, UploadResult<RemoteId>>;
}

/// Creates the check-in once every photo is committed
pub trait CheckinCreationChannel: Send + Sync {
    fn create(
        &self,
        request: CheckinRequest,
    ) -> BoxFuture<'static, Result<CheckinReceipt, CreationError>>;
}
