//! In-memory channel doubles for the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{oneshot, watch};

use crate::channel::{CheckinCreationChannel, UploadChannel, UploadRequest};
use crate::error::{CreationError, UploadError, UploadResult};
use crate::models::{CheckinReceipt, CheckinRequest, RegistryProgress, RemoteId};

/// Upload channel whose calls stay in flight until the test resolves them
pub struct GatedUploads {
    calls: Mutex<Vec<UploadRequest>>,
    pending: Mutex<Vec<(String, oneshot::Sender<UploadResult<RemoteId>>)>>,
}

impl GatedUploads {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<UploadRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Resolves the oldest in-flight call for `uri`
    pub fn complete(&self, uri: &str, result: UploadResult<RemoteId>) {
        let mut pending = self.pending.lock().unwrap();
        let index = pending
            .iter()
            .position(|(u, _)| u == uri)
            .unwrap_or_else(|| panic!("no upload in flight for {}", uri));
        let (_, tx) = pending.remove(index);
        let _ = tx.send(result);
    }
}

impl UploadChannel for GatedUploads {
    fn upload(&self, request: UploadRequest) -> BoxFuture<'static, UploadResult<RemoteId>> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap()
            .push((request.file_uri.clone(), tx));
        self.calls.lock().unwrap().push(request);

        async move {
            rx.await
                .unwrap_or_else(|_| Err(UploadError::Transport("call dropped".to_string())))
        }
        .boxed()
    }
}

/// Creation channel that records requests and answers from a script.
///
/// A gated instance holds every call until [`RecordingCreation::release`].
pub struct RecordingCreation {
    requests: Mutex<Vec<CheckinRequest>>,
    responses: Mutex<Vec<Result<CheckinReceipt, CreationError>>>,
    gates: Mutex<Vec<oneshot::Sender<()>>>,
    gated: bool,
    count: AtomicUsize,
}

impl RecordingCreation {
    /// Answers immediately, popping scripted responses in order
    pub fn answering(responses: Vec<Result<CheckinReceipt, CreationError>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().rev().collect()),
            gates: Mutex::new(Vec::new()),
            gated: false,
            count: AtomicUsize::new(0),
        }
    }

    /// Like [`answering`](Self::answering) but every call waits for `release`
    pub fn gated(responses: Vec<Result<CheckinReceipt, CreationError>>) -> Self {
        Self {
            gated: true,
            ..Self::answering(responses)
        }
    }

    pub fn requests(&self) -> Vec<CheckinRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        for gate in self.gates.lock().unwrap().drain(..) {
            let _ = gate.send(());
        }
    }
}

impl CheckinCreationChannel for RecordingCreation {
    fn create(
        &self,
        request: CheckinRequest,
    ) -> BoxFuture<'static, Result<CheckinReceipt, CreationError>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let response = self.responses.lock().unwrap().pop().unwrap_or_else(|| {
            Ok(CheckinReceipt {
                checkin_id: "checkin-1".to_string(),
            })
        });

        let gate = if self.gated {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push(tx);
            Some(rx)
        } else {
            None
        };

        async move {
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            response
        }
        .boxed()
    }
}

pub fn receipt(id: &str) -> CheckinReceipt {
    CheckinReceipt {
        checkin_id: id.to_string(),
    }
}

/// Waits until `count` upload results have been applied or discarded
pub async fn settled(progress: &mut watch::Receiver<RegistryProgress>, count: u64) {
    tokio::time::timeout(Duration::from_secs(5), progress.wait_for(|p| p.settled >= count))
        .await
        .expect("uploads did not settle in time")
        .expect("registry dropped");
}
