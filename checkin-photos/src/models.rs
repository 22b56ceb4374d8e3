use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UploadError;

/// Identifier of the event a check-in belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side filename handed out for a committed photo upload.
///
/// Never empty: the only way to build one is [`RemoteId::new`], which rejects
/// empty names, so a `Committed` task always carries a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A photo as delivered by the asset picker (camera or gallery)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAsset {
    pub local_uri: String,
    pub mime_type: Option<String>,
    pub display_name: Option<String>,
}

impl PhotoAsset {
    pub fn new(local_uri: impl Into<String>) -> Self {
        Self {
            local_uri: local_uri.into(),
            mime_type: None,
            display_name: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Handle returned by the registry so the UI can bind to one photo slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(Uuid);

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload state of a single photo
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// Created, channel not yet invoked
    Pending,
    /// Channel invoked, waiting for the result
    Uploading,
    /// Upload accepted by the server
    Committed(RemoteId),
    /// Upload failed; only ever observed right before eviction
    Failed(UploadError),
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Pending => "pending",
            UploadState::Uploading => "uploading",
            UploadState::Committed(_) => "committed",
            UploadState::Failed(_) => "failed",
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, UploadState::Committed(_))
    }
}

/// Read-only view of one registry slot (for rendering thumbnails and spinners)
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoView {
    pub handle: TaskHandle,
    pub local_uri: String,
    pub state: UploadState,
}

/// Aggregate counters published on every registry change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryProgress {
    pub total: usize,
    pub uploading: usize,
    pub committed: usize,
    /// Upload results received so far, applied or discarded
    pub settled: u64,
}

impl RegistryProgress {
    pub fn is_ready(&self) -> bool {
        self.total > 0 && self.committed == self.total
    }
}

/// Why the registry cannot be submitted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    NoPhotos,
    StillUploading { pending: usize },
}

impl std::fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotReadyReason::NoPhotos => write!(f, "no photos added"),
            NotReadyReason::StillUploading { pending } => {
                write!(f, "{} photo(s) still uploading", pending)
            }
        }
    }
}

/// One-shot notification about a photo evicted after a failed upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFailure {
    pub local_uri: String,
    pub reason: UploadError,
}

/// Submission state of a check-in draft
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded { checkin_id: String },
    Failed(String),
}

/// Body of the check-in creation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckinRequest {
    pub event_id: EventId,
    pub caption: String,
    pub photos: Vec<RemoteId>,
}

/// Successful result of the check-in creation call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckinReceipt {
    pub checkin_id: String,
}

/// What a submit request ended in, when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The check-in was created; the draft is closed
    Created(CheckinReceipt),
    /// Another submission is in flight; this request was dropped
    AlreadySubmitting,
    /// The draft was already submitted successfully
    AlreadySubmitted,
}
