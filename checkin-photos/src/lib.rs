//! # Check-in Photos
//!
//! Orchestrates an event check-in draft: the photos a user attaches, their
//! parallel uploads, and the final check-in submission.
//!
//! This crate provides:
//! - [`PhotoUploadTask`]: one photo's upload lifecycle
//! - [`PhotoRegistry`]: the ordered photo set of a draft and its readiness
//! - [`CheckinSubmissionController`]: caption, preconditions and submission
//! - [`UploadChannel`] / [`CheckinCreationChannel`]: the backend boundary,
//!   with a REST implementation behind the `http` feature
//!
//! ## Separation of Concerns
//!
//! Rendering, navigation and credential storage stay in the application. The
//! controller reports typed outcomes ([`SubmitOutcome`], [`UploadFailure`],
//! [`CheckinError::user_message`]) for the presentation layer to show.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use checkin_photos::{CheckinSubmissionController, EventId, PhotoAsset};
//!
//! let draft = CheckinSubmissionController::new(EventId::new("ev-1"), api.clone(), api);
//! draft.add_photo(PhotoAsset::new("file:///photos/a.jpg").with_mime_type("image/jpeg"))?;
//! draft.set_caption("Great event!")?;
//! draft.photos().wait_until_settled().await;
//! let outcome = draft.submit().await?;
//! ```

pub mod channel;
pub mod controller;
pub mod error;
pub mod models;
pub mod picker;
pub mod registry;
pub mod task;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;

pub use channel::{CheckinCreationChannel, UploadChannel, UploadRequest};
pub use controller::CheckinSubmissionController;
pub use error::{CheckinError, CreationError, UploadError, UploadResult};
pub use models::{
    CheckinReceipt, CheckinRequest, EventId, NotReadyReason, PhotoAsset, PhotoView,
    RegistryProgress, RemoteId, SubmissionState, SubmitOutcome, TaskHandle, UploadFailure,
    UploadState,
};
pub use picker::{asset_from_path, assets_from_paths, PickerError};
pub use registry::{PhotoRegistry, DEFAULT_PHOTO_LIMIT};
pub use task::PhotoUploadTask;

#[cfg(feature = "http")]
pub use http::{CredentialProvider, HttpApiConfig, HttpCheckinApi};
