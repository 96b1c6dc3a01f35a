//! Client core for submitting ultrasound images to a remote classifier.
//!
//! [`FileIntake`] validates what the user picks or drops, and
//! [`AnalysisController`] sends accepted files to the server and tracks the
//! resulting [`AnalysisSession`].

pub mod client;
pub mod config;
pub mod controller;
pub mod display;
pub mod intake;
pub mod prediction;
pub mod preview;
pub mod session;
pub mod workflow;

pub use client::{ClientError, HttpPredictClient, PredictClient};
pub use config::ClientConfig;
pub use controller::AnalysisController;
pub use intake::{CandidateFile, FileIntake, RejectReason, Validation};
pub use prediction::{ClassLabel, ClassProbabilities, HealthStatus, PredictionResult};
pub use preview::{Preview, render_preview};
pub use session::{AnalysisError, AnalysisSession, RequestId, SessionStatus};
pub use workflow::{Dispatch, IntakeSource, submit_for_analysis};
