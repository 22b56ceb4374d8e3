use crate::models::{NotReadyReason, TaskHandle};

/// Result type for upload channel calls
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors an upload channel can report for a single photo
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Upload rejected: {0}")]
    ServerRejected(String),
    #[error("Not authenticated")]
    Unauthenticated,
}

/// Errors the check-in creation channel can report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreationError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("{0}")]
    Validation(String),
    #[error("Not authenticated")]
    Unauthenticated,
}

/// Errors surfaced by the check-in draft and its photo registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckinError {
    #[error("Photo already added: {0}")]
    DuplicateAsset(String),
    #[error("Photo limit reached ({limit})")]
    TooManyPhotos { limit: usize },
    #[error("Task {task} cannot {operation} while {state}")]
    TaskInvalidState {
        task: TaskHandle,
        state: &'static str,
        operation: &'static str,
    },
    #[error("Upload of {local_uri} failed: {reason}")]
    UploadFailed {
        local_uri: String,
        reason: UploadError,
    },
    #[error("Photos not ready: {0}")]
    NotReady(NotReadyReason),
    #[error("Caption is required")]
    CaptionRequired,
    #[error("Check-in failed: {0}")]
    SubmissionFailed(CreationError),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Check-in draft is closed")]
    DraftClosed,
    #[error("No async runtime available to start uploads")]
    NoRuntime,
}

impl CheckinError {
    /// Only contract violations between collaborators are fatal
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CheckinError::TaskInvalidState { .. })
    }

    /// Message for a transient notification (toast) in the UI
    pub fn user_message(&self) -> String {
        match self {
            CheckinError::DuplicateAsset(_) => "This photo was already added.".to_string(),
            CheckinError::TooManyPhotos { limit } => {
                format!("You can add up to {} photos.", limit)
            }
            CheckinError::TaskInvalidState { .. } | CheckinError::NoRuntime => {
                "Something went wrong. Please try again.".to_string()
            }
            CheckinError::UploadFailed { reason, .. } => {
                format!("{}, please try again", reason)
            }
            CheckinError::NotReady(NotReadyReason::NoPhotos) => {
                "At least one Photo is required".to_string()
            }
            CheckinError::NotReady(NotReadyReason::StillUploading { .. }) => {
                "Please wait until all photos are uploaded".to_string()
            }
            CheckinError::CaptionRequired => "Caption is required".to_string(),
            CheckinError::SubmissionFailed(reason) => reason.to_string(),
            CheckinError::Unauthenticated => "Please log in again.".to_string(),
            CheckinError::DraftClosed => "This check-in was already submitted.".to_string(),
        }
    }
}

impl From<CreationError> for CheckinError {
    fn from(err: CreationError) -> Self {
        match err {
            CreationError::Unauthenticated => CheckinError::Unauthenticated,
            other => CheckinError::SubmissionFailed(other),
        }
    }
}
