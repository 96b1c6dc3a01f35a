use crate::client::PredictClient;
use crate::intake::CandidateFile;
use crate::prediction::{PredictResponse, PredictionResult};
use crate::session::{AnalysisError, AnalysisSession, RequestId};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

type Completion = (RequestId, Result<PredictionResult, AnalysisError>);

/// Called from a worker thread once its completion is queued, so an idle owner
/// knows to [`poll`](AnalysisController::poll).
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Drives the analysis session: starts requests on worker threads and applies
/// their outcomes on the owner's thread via [`poll`](Self::poll) or
/// [`wait`](Self::wait).
///
/// Overlapping submissions are not refused here; the caller is expected to
/// disable intake while uploading. A superseded request still runs to
/// completion, but its outcome is discarded by the session.
pub struct AnalysisController {
    session: AnalysisSession,
    client: Arc<dyn PredictClient>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    waker: Option<Waker>,
}

impl AnalysisController {
    pub fn new(client: Arc<dyn PredictClient>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: AnalysisSession::new(),
            client,
            tx,
            rx,
            waker: None,
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Point later submissions at another server. Requests already running keep
    /// the client they started with.
    pub fn set_client(&mut self, client: Arc<dyn PredictClient>) {
        self.client = client;
    }

    /// Run `waker` after each request finishes, e.g. to schedule a repaint.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    /// Move to `Uploading` right away and send `file` in the background.
    pub fn start_analysis(&mut self, file: Arc<CandidateFile>) -> RequestId {
        let id = self.session.begin();
        tracing::info!("request {id}: analysing {}", file.name());

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let spawned = thread::Builder::new()
            .name(format!("analysis-{id}"))
            .spawn(move || {
                let outcome = run_request(client.as_ref(), &file);
                // The receiver only goes away with the controller.
                let _ = tx.send((id, outcome));
                if let Some(wake) = waker {
                    wake();
                }
            });
        if let Err(e) = spawned {
            self.session.complete(
                id,
                Err(AnalysisError::Transport(format!(
                    "could not start request worker: {e}"
                ))),
            );
        }
        id
    }

    /// Apply every completion that has arrived. Returns how many changed the
    /// session.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((id, outcome)) = self.rx.try_recv() {
            if self.session.complete(id, outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until the pending request resolves or `timeout` elapses. Returns
    /// true once the session is no longer uploading.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.session.is_uploading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok((id, outcome)) => {
                    self.session.complete(id, outcome);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    /// Return to `Idle`. Does not cancel a running request.
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

fn run_request(
    client: &dyn PredictClient,
    file: &CandidateFile,
) -> Result<PredictionResult, AnalysisError> {
    client
        .predict(file)
        .map_err(|e| AnalysisError::Transport(e.to_string()))
        .and_then(PredictResponse::into_outcome)
}
