//! Lifecycle of a single photo upload.
//!
//! ```text
//! Pending --start--> Uploading --commit--> Committed(id)
//!                              \--fail---> Failed(reason)   (evicted by the registry)
//! ```
//!
//! Every transition checks its source state; a transition from the wrong
//! state returns [`CheckinError::TaskInvalidState`] instead of silently doing
//! nothing.

use futures::future::BoxFuture;

use crate::channel::{UploadChannel, UploadRequest};
use crate::error::{CheckinError, UploadError, UploadResult};
use crate::models::{EventId, PhotoAsset, PhotoView, RemoteId, TaskHandle, UploadState};

#[derive(Debug, Clone)]
pub struct PhotoUploadTask {
    handle: TaskHandle,
    asset: PhotoAsset,
    state: UploadState,
}

impl PhotoUploadTask {
    pub fn new(asset: PhotoAsset) -> Self {
        Self {
            handle: TaskHandle::new(),
            asset,
            state: UploadState::Pending,
        }
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    pub fn local_uri(&self) -> &str {
        &self.asset.local_uri
    }

    pub fn asset(&self) -> &PhotoAsset {
        &self.asset
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn remote_id(&self) -> Option<&RemoteId> {
        match &self.state {
            UploadState::Committed(id) => Some(id),
            _ => None,
        }
    }

    pub fn view(&self) -> PhotoView {
        PhotoView {
            handle: self.handle,
            local_uri: self.asset.local_uri.clone(),
            state: self.state.clone(),
        }
    }

    /// Moves the task to `Uploading` and invokes the channel once.
    ///
    /// Returns the in-flight call; the caller decides where it runs and
    /// feeds the result back through [`commit`](Self::commit) or
    /// [`fail`](Self::fail).
    pub fn start(
        &mut self,
        channel: &dyn UploadChannel,
        event_id: &EventId,
    ) -> Result<BoxFuture<'static, UploadResult<RemoteId>>, CheckinError> {
        self.expect_state(matches!(self.state, UploadState::Pending), "start")?;

        self.state = UploadState::Uploading;
        log::debug!("Photo {} uploading ({})", self.asset.local_uri, self.handle);

        Ok(channel.upload(UploadRequest {
            event_id: event_id.clone(),
            file_uri: self.asset.local_uri.clone(),
            mime_type: self.asset.mime_type.clone(),
            display_name: self.asset.display_name.clone(),
        }))
    }

    pub fn commit(&mut self, remote_id: RemoteId) -> Result<(), CheckinError> {
        self.expect_state(matches!(self.state, UploadState::Uploading), "commit")?;

        log::debug!("Photo {} committed as {}", self.asset.local_uri, remote_id);
        self.state = UploadState::Committed(remote_id);
        Ok(())
    }

    pub fn fail(&mut self, reason: UploadError) -> Result<(), CheckinError> {
        self.expect_state(matches!(self.state, UploadState::Uploading), "fail")?;

        self.state = UploadState::Failed(reason);
        Ok(())
    }

    fn expect_state(&self, valid: bool, operation: &'static str) -> Result<(), CheckinError> {
        if valid {
            Ok(())
        } else {
            Err(CheckinError::TaskInvalidState {
                task: self.handle,
                state: self.state.name(),
                operation,
            })
        }
    }
}
