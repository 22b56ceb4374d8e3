//! Ordered set of photo uploads for one check-in draft.
//!
//! Each added photo starts uploading right away on the tokio runtime. Uploads
//! run independently and may finish in any order. Their results are applied
//! through a callback holding a weak reference to the registry's shared
//! state, so all mutation (user add/remove and upload completions) goes
//! through the same mutex and a result for a removed photo, or for a dropped
//! registry, is simply discarded.
//!
//! A failed upload evicts its photo and emits one [`UploadFailure`] on the
//! channel returned by [`PhotoRegistry::new`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{mpsc, watch};

use crate::channel::UploadChannel;
use crate::error::{CheckinError, UploadResult};
use crate::models::{
    EventId, NotReadyReason, PhotoAsset, PhotoView, RegistryProgress, RemoteId, TaskHandle,
    UploadFailure, UploadState,
};
use crate::task::PhotoUploadTask;

/// The gallery picker allows at most five photos per check-in
pub const DEFAULT_PHOTO_LIMIT: usize = 5;

#[derive(Default)]
struct RegistryState {
    tasks: Vec<PhotoUploadTask>,
    settled: u64,
    closed: bool,
}

impl RegistryState {
    fn progress(&self) -> RegistryProgress {
        let committed = self
            .tasks
            .iter()
            .filter(|t| t.state().is_committed())
            .count();
        RegistryProgress {
            total: self.tasks.len(),
            uploading: self.tasks.len() - committed,
            committed,
            settled: self.settled,
        }
    }

    fn position(&self, handle: TaskHandle) -> Option<usize> {
        self.tasks.iter().position(|t| t.handle() == handle)
    }
}

struct Shared {
    state: Mutex<RegistryState>,
    progress: watch::Sender<RegistryProgress>,
    failures: mpsc::UnboundedSender<UploadFailure>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RegistryState) {
        self.progress.send_replace(state.progress());
    }

    /// Completion callback for one upload
    fn complete(&self, handle: TaskHandle, result: UploadResult<RemoteId>) {
        let mut state = self.lock();
        state.settled += 1;

        let Some(index) = state.position(handle) else {
            log::debug!("Discarding upload result for removed photo {}", handle);
            self.publish(&state);
            return;
        };

        match result {
            Ok(remote_id) => {
                if let Err(e) = state.tasks[index].commit(remote_id) {
                    log::error!("Upload completion rejected: {}", e);
                }
            }
            Err(reason) => {
                let mut task = state.tasks.remove(index);
                if let Err(e) = task.fail(reason.clone()) {
                    log::error!("Upload failure rejected: {}", e);
                }
                log::warn!(
                    "Upload of {} failed, removing photo: {}",
                    task.local_uri(),
                    reason
                );
                let failure = UploadFailure {
                    local_uri: task.local_uri().to_string(),
                    reason,
                };
                if self.failures.send(failure).is_err() {
                    log::debug!("No listener for upload failures");
                }
            }
        }

        self.publish(&state);
    }
}

pub struct PhotoRegistry {
    event_id: EventId,
    channel: Arc<dyn UploadChannel>,
    photo_limit: usize,
    shared: Arc<Shared>,
}

impl PhotoRegistry {
    /// Creates an empty registry uploading photos for `event_id`.
    ///
    /// The receiver yields one [`UploadFailure`] per evicted photo.
    pub fn new(
        event_id: EventId,
        channel: Arc<dyn UploadChannel>,
    ) -> (Self, mpsc::UnboundedReceiver<UploadFailure>) {
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        let (progress_tx, _) = watch::channel(RegistryProgress::default());

        let registry = Self {
            event_id,
            channel,
            photo_limit: DEFAULT_PHOTO_LIMIT,
            shared: Arc::new(Shared {
                state: Mutex::new(RegistryState::default()),
                progress: progress_tx,
                failures: failures_tx,
            }),
        };
        (registry, failures_rx)
    }

    pub fn with_photo_limit(mut self, limit: usize) -> Self {
        self.photo_limit = limit;
        self
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Adds a photo and starts its upload.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add(&self, asset: PhotoAsset) -> Result<TaskHandle, CheckinError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CheckinError::NoRuntime)?;

        let mut state = self.shared.lock();
        if state.closed {
            return Err(CheckinError::DraftClosed);
        }
        if state.tasks.iter().any(|t| t.local_uri() == asset.local_uri) {
            return Err(CheckinError::DuplicateAsset(asset.local_uri));
        }
        if state.tasks.len() >= self.photo_limit {
            return Err(CheckinError::TooManyPhotos {
                limit: self.photo_limit,
            });
        }

        let mut task = PhotoUploadTask::new(asset);
        let handle = task.handle();
        let call = task.start(self.channel.as_ref(), &self.event_id)?;
        state.tasks.push(task);
        self.shared.publish(&state);
        drop(state);

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        runtime.spawn(async move {
            let result = call.await;
            match shared.upgrade() {
                Some(shared) => shared.complete(handle, result),
                None => log::debug!("Registry gone, discarding upload result for {}", handle),
            }
        });

        Ok(handle)
    }

    /// Removes a photo in any state. An upload still in flight keeps running
    /// but its result will be ignored.
    pub fn remove(&self, handle: TaskHandle) -> Result<(), CheckinError> {
        let mut state = self.shared.lock();
        let index = state
            .position(handle)
            .ok_or(CheckinError::TaskInvalidState {
                task: handle,
                state: "evicted",
                operation: "remove",
            })?;

        let task = state.tasks.remove(index);
        log::debug!(
            "Removed photo {} while {}",
            task.local_uri(),
            task.state().name()
        );
        self.shared.publish(&state);
        Ok(())
    }

    pub fn is_ready_for_submission(&self) -> bool {
        self.readiness().is_ok()
    }

    pub fn readiness(&self) -> Result<(), NotReadyReason> {
        let progress = self.shared.lock().progress();
        if progress.total == 0 {
            Err(NotReadyReason::NoPhotos)
        } else if progress.uploading > 0 {
            Err(NotReadyReason::StillUploading {
                pending: progress.uploading,
            })
        } else {
            Ok(())
        }
    }

    /// Server identifiers in the order the photos were added
    pub fn committed_identifiers(&self) -> Result<Vec<RemoteId>, CheckinError> {
        let state = self.shared.lock();
        if state.tasks.is_empty() {
            return Err(CheckinError::NotReady(NotReadyReason::NoPhotos));
        }

        state
            .tasks
            .iter()
            .map(|t| t.remote_id().cloned())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                CheckinError::NotReady(NotReadyReason::StillUploading {
                    pending: state.progress().uploading,
                })
            })
    }

    pub fn len(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn photos(&self) -> Vec<PhotoView> {
        self.shared.lock().tasks.iter().map(|t| t.view()).collect()
    }

    pub fn get(&self, handle: TaskHandle) -> Option<PhotoView> {
        let state = self.shared.lock();
        state.position(handle).map(|i| state.tasks[i].view())
    }

    pub fn state_of(&self, handle: TaskHandle) -> Option<UploadState> {
        self.get(handle).map(|view| view.state)
    }

    pub fn progress(&self) -> RegistryProgress {
        self.shared.lock().progress()
    }

    /// Receives a new [`RegistryProgress`] after every change
    pub fn subscribe(&self) -> watch::Receiver<RegistryProgress> {
        self.shared.progress.subscribe()
    }

    /// Resolves once no photo is uploading anymore
    pub async fn wait_until_settled(&self) -> RegistryProgress {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|p| p.uploading == 0).await.map(|p| *p);
        settled.unwrap_or_else(|_| self.progress())
    }

    /// Drops every photo and refuses further additions
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        state.tasks.clear();
        self.shared.publish(&state);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}
