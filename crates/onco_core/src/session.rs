//! The single live analysis session and its state machine.
//!
//! ```text
//! Idle --begin--> Uploading --complete(Ok)--> Succeeded
//!                 Uploading --complete(Err)--> Failed
//! Succeeded | Failed --begin--> Uploading
//! any --reset--> Idle
//! ```

use crate::prediction::PredictionResult;
use chrono::{DateTime, Local};
use std::fmt;
use thiserror::Error;

/// Shown for network, timeout and unreadable-response failures.
pub const CONNECTION_FAILED_MESSAGE: &str = "Connection to AI server failed.";
/// Shown when the server reports failure without saying why.
pub const PREDICTION_FAILED_MESSAGE: &str = "Prediction failed";

/// Why an analysis ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The server answered and refused the image.
    #[error("{0}")]
    ServerReported(String),
    /// The server could not be reached or its answer could not be read. The
    /// detail is for logs; users see [`CONNECTION_FAILED_MESSAGE`].
    #[error("Connection to AI server failed.")]
    Transport(String),
}

impl AnalysisError {
    pub fn user_message(&self) -> &str {
        match self {
            AnalysisError::ServerReported(message) => message,
            AnalysisError::Transport(_) => CONNECTION_FAILED_MESSAGE,
        }
    }
}

/// Monotonic id of one `begin` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
enum SessionState {
    Idle,
    Uploading(RequestId),
    Succeeded(PredictionResult),
    Failed(AnalysisError),
}

/// Owned by whoever drives the UI; the result and error live inside the state
/// variant, so neither can outlive the status that carries it.
#[derive(Debug)]
pub struct AnalysisSession {
    state: SessionState,
    last_request: u64,
    completed_at: Option<DateTime<Local>>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            last_request: 0,
            completed_at: None,
        }
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Uploading`, dropping any earlier result or error, and return the id
    /// the eventual completion must carry.
    pub fn begin(&mut self) -> RequestId {
        self.last_request += 1;
        let id = RequestId(self.last_request);
        self.state = SessionState::Uploading(id);
        self.completed_at = None;
        id
    }

    /// Apply the outcome of request `id`. Outcomes for any request other than the
    /// one currently awaited are discarded and `false` is returned.
    pub fn complete(
        &mut self,
        id: RequestId,
        outcome: Result<PredictionResult, AnalysisError>,
    ) -> bool {
        if self.pending_request() != Some(id) {
            tracing::warn!(
                "discarding outcome of request {id}; session is {:?}",
                self.status()
            );
            return false;
        }
        self.state = match outcome {
            Ok(result) => {
                tracing::info!(
                    "request {id} succeeded: {} ({:.1}%)",
                    result.prediction,
                    result.confidence
                );
                SessionState::Succeeded(result)
            }
            Err(err) => {
                match &err {
                    AnalysisError::ServerReported(msg) => {
                        tracing::warn!("request {id} rejected by server: {msg}")
                    }
                    AnalysisError::Transport(detail) => {
                        tracing::warn!("request {id} transport failure: {detail}")
                    }
                }
                SessionState::Failed(err)
            }
        };
        self.completed_at = Some(Local::now());
        true
    }

    /// Back to `Idle` from any state. A request still in flight will be ignored
    /// when it completes.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.completed_at = None;
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Uploading(_) => SessionStatus::Uploading,
            SessionState::Succeeded(_) => SessionStatus::Succeeded,
            SessionState::Failed(_) => SessionStatus::Failed,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.status() == SessionStatus::Uploading
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.state {
            SessionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.state {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error().map(AnalysisError::user_message)
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        match self.state {
            SessionState::Uploading(id) => Some(id),
            _ => None,
        }
    }

    /// Id of the most recent `begin`, if any.
    pub fn last_request(&self) -> Option<RequestId> {
        (self.last_request > 0).then_some(RequestId(self.last_request))
    }

    pub fn completed_at(&self) -> Option<DateTime<Local>> {
        self.completed_at
    }
}
