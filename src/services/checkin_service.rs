use std::sync::Arc;

use checkin_photos::{
    CheckinError, CheckinSubmissionController, EventId, HttpCheckinApi, PhotoAsset,
    SubmitOutcome, UploadError, UploadFailure,
};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::TokenSession;

/// Summary of a finished check-in
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinReport {
    pub checkin_id: String,
    pub photos: usize,
    /// Photos that failed to upload and were left out
    pub dropped: Vec<UploadFailure>,
}

/// Opens a draft for `event_id` against the configured API
pub fn open_draft(
    config: &AppConfig,
    session: TokenSession,
    event_id: &str,
) -> Result<CheckinSubmissionController, AppError> {
    if !session.is_logged_in() {
        return Err(AppError::NotLoggedIn);
    }

    let api = Arc::new(
        HttpCheckinApi::new(config.http_api_config(), Arc::new(session))
            .map_err(|e| AppError::Other(format!("HTTP client error: {}", e)))?,
    );
    Ok(CheckinSubmissionController::new(
        EventId::new(event_id),
        api.clone(),
        api,
    ))
}

/// Adds the photos, waits for their uploads and submits the check-in.
///
/// An upload rejected for missing credentials always aborts with
/// `Unauthenticated`. Unless `allow_partial` is set, any other failed upload
/// aborts before submitting so the user can pick the photo again.
pub async fn run_checkin(
    draft: &CheckinSubmissionController,
    assets: Vec<PhotoAsset>,
    caption: &str,
    allow_partial: bool,
) -> Result<CheckinReport, AppError> {
    draft.set_caption(caption)?;

    for asset in assets {
        match draft.add_photo(asset) {
            Ok(handle) => log::debug!("Queued photo {}", handle),
            Err(CheckinError::DuplicateAsset(uri)) => {
                log::warn!("Skipping photo selected twice: {}", uri)
            }
            Err(e) => return Err(e.into()),
        }
    }

    let progress = draft.photos().wait_until_settled().await;
    let dropped = draft.drain_upload_failures();
    for failure in &dropped {
        log::warn!("Photo {} was removed: {}", failure.local_uri, failure.reason);
    }
    log::info!(
        "{} photo(s) uploaded, {} failed",
        progress.committed,
        dropped.len()
    );

    if dropped.iter().any(|f| f.reason == UploadError::Unauthenticated) {
        return Err(CheckinError::Unauthenticated.into());
    }

    if !allow_partial {
        if let Some(failure) = dropped.first() {
            return Err(CheckinError::UploadFailed {
                local_uri: failure.local_uri.clone(),
                reason: failure.reason.clone(),
            }
            .into());
        }
    }

    match draft.submit().await? {
        SubmitOutcome::Created(receipt) => Ok(CheckinReport {
            checkin_id: receipt.checkin_id,
            photos: progress.committed,
            dropped,
        }),
        SubmitOutcome::AlreadySubmitted => Err(CheckinError::DraftClosed.into()),
        SubmitOutcome::AlreadySubmitting => Err(AppError::Other(
            "A check-in for this draft is already being submitted".to_string(),
        )),
    }
}
