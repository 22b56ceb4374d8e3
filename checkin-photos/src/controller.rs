//! The check-in draft and its submission state machine.
//!
//! ```text
//! Idle ----submit----> Submitting ----ok----> Succeeded (draft closed)
//!  ^                      |   \
//!  |                      |    \--error--> Failed(reason) --submit--> Submitting
//!  +--- future dropped ---+
//! ```
//!
//! Both preconditions (all photos committed, caption present) are checked
//! synchronously before the creation call. A submit issued while another one
//! is in flight is dropped. A failed submission leaves caption and photos in
//! place, so a retry reuses the committed identifiers and uploads nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::channel::{CheckinCreationChannel, UploadChannel};
use crate::error::CheckinError;
use crate::models::{
    CheckinRequest, EventId, PhotoAsset, SubmissionState, SubmitOutcome, TaskHandle,
    UploadFailure,
};
use crate::registry::PhotoRegistry;

struct DraftForm {
    caption: String,
    submission: SubmissionState,
}

pub struct CheckinSubmissionController {
    photos: PhotoRegistry,
    creation: Arc<dyn CheckinCreationChannel>,
    form: Mutex<DraftForm>,
    failures: tokio::sync::Mutex<mpsc::UnboundedReceiver<UploadFailure>>,
}

impl CheckinSubmissionController {
    /// Opens a new draft for `event_id`
    pub fn new(
        event_id: EventId,
        uploads: Arc<dyn UploadChannel>,
        creation: Arc<dyn CheckinCreationChannel>,
    ) -> Self {
        let (photos, failures) = PhotoRegistry::new(event_id, uploads);
        Self::with_registry(photos, failures, creation)
    }

    pub fn with_registry(
        photos: PhotoRegistry,
        failures: mpsc::UnboundedReceiver<UploadFailure>,
        creation: Arc<dyn CheckinCreationChannel>,
    ) -> Self {
        log::debug!("Opened check-in draft for event {}", photos.event_id());
        Self {
            photos,
            creation,
            form: Mutex::new(DraftForm {
                caption: String::new(),
                submission: SubmissionState::Idle,
            }),
            failures: tokio::sync::Mutex::new(failures),
        }
    }

    pub fn event_id(&self) -> &EventId {
        self.photos.event_id()
    }

    pub fn photos(&self) -> &PhotoRegistry {
        &self.photos
    }

    pub fn add_photo(&self, asset: PhotoAsset) -> Result<TaskHandle, CheckinError> {
        self.photos.add(asset)
    }

    pub fn remove_photo(&self, handle: TaskHandle) -> Result<(), CheckinError> {
        self.photos.remove(handle)
    }

    pub fn caption(&self) -> String {
        self.lock_form().caption.clone()
    }

    pub fn set_caption(&self, caption: impl Into<String>) -> Result<(), CheckinError> {
        let mut form = self.lock_form();
        if matches!(form.submission, SubmissionState::Succeeded { .. }) {
            return Err(CheckinError::DraftClosed);
        }
        form.caption = caption.into();
        Ok(())
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.lock_form().submission.clone()
    }

    /// Whether a submit right now would reach the network
    pub fn can_submit(&self) -> bool {
        let form = self.lock_form();
        matches!(
            form.submission,
            SubmissionState::Idle | SubmissionState::Failed(_)
        ) && validate_caption(&form.caption).is_ok()
            && self.photos.is_ready_for_submission()
    }

    /// Next photo evicted after a failed upload, waiting if there is none yet
    pub async fn next_upload_failure(&self) -> Option<UploadFailure> {
        self.failures.lock().await.recv().await
    }

    /// Upload failures reported so far, without waiting.
    ///
    /// Returns nothing while another caller is waiting in
    /// [`next_upload_failure`](Self::next_upload_failure); that caller gets
    /// the failures instead.
    pub fn drain_upload_failures(&self) -> Vec<UploadFailure> {
        let mut drained = Vec::new();
        match self.failures.try_lock() {
            Ok(mut failures) => {
                while let Ok(failure) = failures.try_recv() {
                    drained.push(failure);
                }
            }
            Err(_) => log::debug!("Upload failures are awaited elsewhere, nothing drained"),
        }
        drained
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, CheckinError> {
        let request = {
            let mut form = self.lock_form();
            match form.submission {
                SubmissionState::Submitting => {
                    log::debug!("Check-in already submitting, ignoring submit");
                    return Ok(SubmitOutcome::AlreadySubmitting);
                }
                SubmissionState::Succeeded { .. } => return Ok(SubmitOutcome::AlreadySubmitted),
                SubmissionState::Idle | SubmissionState::Failed(_) => {}
            }

            let photos = self.photos.committed_identifiers()?;
            validate_caption(&form.caption)?;

            form.submission = SubmissionState::Submitting;
            CheckinRequest {
                event_id: self.event_id().clone(),
                caption: form.caption.clone(),
                photos,
            }
        };

        log::info!(
            "Submitting check-in for event {} with {} photo(s)",
            request.event_id,
            request.photos.len()
        );
        let mut in_flight = InFlight {
            form: &self.form,
            finished: false,
        };
        let result = self.creation.create(request).await;
        in_flight.finished = true;

        let mut form = self.lock_form();
        match result {
            Ok(receipt) => {
                log::info!("Check-in {} created", receipt.checkin_id);
                form.submission = SubmissionState::Succeeded {
                    checkin_id: receipt.checkin_id.clone(),
                };
                drop(form);
                self.photos.close();
                Ok(SubmitOutcome::Created(receipt))
            }
            Err(e) => {
                log::warn!("Check-in for event {} failed: {}", self.event_id(), e);
                form.submission = SubmissionState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    fn lock_form(&self) -> MutexGuard<'_, DraftForm> {
        lock(&self.form)
    }
}

fn lock(form: &Mutex<DraftForm>) -> MutexGuard<'_, DraftForm> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validate_caption(caption: &str) -> Result<(), CheckinError> {
    if caption.trim().is_empty() {
        Err(CheckinError::CaptionRequired)
    } else {
        Ok(())
    }
}

/// Puts the draft back to `Idle` if a submit future is dropped mid-call
struct InFlight<'a> {
    form: &'a Mutex<DraftForm>,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut form = lock(self.form);
        if form.submission == SubmissionState::Submitting {
            log::debug!("Check-in submission abandoned");
            form.submission = SubmissionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CreationError, UploadError};
    use crate::models::{NotReadyReason, RemoteId};
    use crate::testing::{receipt, settled, GatedUploads, RecordingCreation};

    fn id(name: &str) -> RemoteId {
        RemoteId::new(name).unwrap()
    }

    fn controller(
        uploads: &Arc<GatedUploads>,
        creation: &Arc<RecordingCreation>,
    ) -> CheckinSubmissionController {
        CheckinSubmissionController::new(EventId::new("ev-42"), uploads.clone(), creation.clone())
    }

    /// Adds the given uris and commits each one as `id-<uri>`
    async fn committed_draft(
        uploads: &Arc<GatedUploads>,
        draft: &CheckinSubmissionController,
        uris: &[&str],
    ) {
        let mut progress = draft.photos().subscribe();
        for uri in uris {
            draft.add_photo(PhotoAsset::new(*uri)).unwrap();
        }
        for uri in uris {
            uploads.complete(uri, Ok(id(&format!("id-{}", uri))));
        }
        settled(&mut progress, uris.len() as u64).await;
    }

    #[tokio::test]
    async fn test_end_to_end_checkin() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![Ok(receipt("c-1"))]));
        let draft = controller(&uploads, &creation);

        committed_draft(&uploads, &draft, &["uriA", "uriB"]).await;
        draft.set_caption("Great event!").unwrap();
        assert!(draft.can_submit());

        let outcome = draft.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Created(receipt("c-1")));
        assert_eq!(
            creation.requests(),
            vec![CheckinRequest {
                event_id: EventId::new("ev-42"),
                caption: "Great event!".to_string(),
                photos: vec![id("id-uriA"), id("id-uriB")],
            }]
        );
        assert_eq!(
            draft.submission_state(),
            SubmissionState::Succeeded {
                checkin_id: "c-1".to_string()
            }
        );

        // The draft is gone after success
        assert!(draft.photos().is_closed());
        assert_eq!(draft.submit().await.unwrap(), SubmitOutcome::AlreadySubmitted);
        assert_eq!(draft.set_caption("again"), Err(CheckinError::DraftClosed));
        assert_eq!(creation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_photos() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![]));
        let draft = controller(&uploads, &creation);
        draft.set_caption("hello").unwrap();

        let err = draft.submit().await.unwrap_err();
        assert_eq!(err, CheckinError::NotReady(NotReadyReason::NoPhotos));
        assert_eq!(err.user_message(), "At least one Photo is required");
        assert_eq!(draft.submission_state(), SubmissionState::Idle);
        assert_eq!(creation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_while_uploading() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a"]).await;
        draft.add_photo(PhotoAsset::new("b")).unwrap();
        draft.set_caption("hello").unwrap();

        assert!(!draft.can_submit());
        let err = draft.submit().await.unwrap_err();
        assert_eq!(
            err,
            CheckinError::NotReady(NotReadyReason::StillUploading { pending: 1 })
        );
        assert_eq!(draft.submission_state(), SubmissionState::Idle);
        assert_eq!(creation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_caption_is_required() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a"]).await;
        draft.set_caption("   ").unwrap();

        assert_eq!(draft.submit().await.unwrap_err(), CheckinError::CaptionRequired);
        assert_eq!(draft.submission_state(), SubmissionState::Idle);
        assert_eq!(creation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_double_submit_creates_one_checkin() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::gated(vec![Ok(receipt("c-1"))]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a", "b"]).await;
        draft.set_caption("hello").unwrap();

        let first = draft.submit();
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert_eq!(draft.submission_state(), SubmissionState::Submitting);

        assert_eq!(draft.submit().await.unwrap(), SubmitOutcome::AlreadySubmitting);
        assert_eq!(draft.submit().await.unwrap(), SubmitOutcome::AlreadySubmitting);

        creation.release();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Created(receipt("c-1")));
        assert_eq!(creation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_failure_reuses_uploads() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![
            Err(CreationError::Transport("connection reset".to_string())),
            Ok(receipt("c-2")),
        ]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a", "b"]).await;
        draft.set_caption("second try").unwrap();

        let err = draft.submit().await.unwrap_err();
        assert_eq!(
            err,
            CheckinError::SubmissionFailed(CreationError::Transport(
                "connection reset".to_string()
            ))
        );
        assert!(matches!(draft.submission_state(), SubmissionState::Failed(_)));
        assert_eq!(draft.caption(), "second try");
        assert!(draft.photos().is_ready_for_submission());

        let outcome = draft.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Created(receipt("c-2")));

        assert_eq!(uploads.calls().len(), 2);
        let requests = creation.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].photos, requests[1].photos);
    }

    #[tokio::test]
    async fn test_retry_rechecks_preconditions() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![Err(
            CreationError::Validation("Event has ended".to_string()),
        )]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a"]).await;
        draft.set_caption("hello").unwrap();

        let err = draft.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Event has ended");

        draft.set_caption("").unwrap();
        assert_eq!(draft.submit().await.unwrap_err(), CheckinError::CaptionRequired);
        assert!(matches!(draft.submission_state(), SubmissionState::Failed(_)));
        assert_eq!(creation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_is_passed_through() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![Err(
            CreationError::Unauthenticated,
        )]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a"]).await;
        draft.set_caption("hello").unwrap();

        assert_eq!(draft.submit().await.unwrap_err(), CheckinError::Unauthenticated);
        assert!(draft.photos().is_ready_for_submission());
    }

    #[tokio::test]
    async fn test_dropped_submit_returns_to_idle() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::gated(vec![]));
        let draft = controller(&uploads, &creation);
        committed_draft(&uploads, &draft, &["a"]).await;
        draft.set_caption("hello").unwrap();

        {
            let first = draft.submit();
            tokio::pin!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert_eq!(draft.submission_state(), SubmissionState::Submitting);
        }

        assert_eq!(draft.submission_state(), SubmissionState::Idle);
        assert!(draft.can_submit());
    }

    #[tokio::test]
    async fn test_upload_failures_reach_the_controller() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![]));
        let draft = controller(&uploads, &creation);

        draft.add_photo(PhotoAsset::new("a")).unwrap();
        uploads.complete("a", Err(UploadError::Transport("timeout".to_string())));

        let failure = draft.next_upload_failure().await.unwrap();
        assert_eq!(failure.local_uri, "a");
        assert!(draft.photos().is_empty());
        assert!(draft.drain_upload_failures().is_empty());
    }

    #[tokio::test]
    async fn test_drain_yields_to_a_waiting_listener() {
        let uploads = Arc::new(GatedUploads::new());
        let creation = Arc::new(RecordingCreation::answering(vec![]));
        let draft = controller(&uploads, &creation);

        draft.add_photo(PhotoAsset::new("a")).unwrap();

        let waiting = draft.next_upload_failure();
        tokio::pin!(waiting);
        assert!(futures::poll!(waiting.as_mut()).is_pending());

        uploads.complete("a", Err(UploadError::Transport("timeout".to_string())));
        assert!(draft.drain_upload_failures().is_empty());

        let failure = waiting.await.unwrap();
        assert_eq!(failure.local_uri, "a");
    }
}
