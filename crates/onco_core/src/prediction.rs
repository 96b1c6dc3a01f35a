//! Prediction payloads exchanged with the analysis server.

use crate::session::{AnalysisError, PREDICTION_FAILED_MESSAGE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic classes the server predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Benign,
    Malignant,
    Normal,
}

impl ClassLabel {
    /// Fixed display order.
    pub const ALL: [ClassLabel; 3] = [ClassLabel::Benign, ClassLabel::Malignant, ClassLabel::Normal];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassLabel::Benign => "benign",
            ClassLabel::Malignant => "malignant",
            ClassLabel::Normal => "normal",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-class probabilities in percent. Stored as received; not normalised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassProbabilities {
    pub benign: f64,
    pub malignant: f64,
    pub normal: f64,
}

impl ClassProbabilities {
    pub fn get(&self, label: ClassLabel) -> f64 {
        match label {
            ClassLabel::Benign => self.benign,
            ClassLabel::Malignant => self.malignant,
            ClassLabel::Normal => self.normal,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, f64)> + '_ {
        ClassLabel::ALL.into_iter().map(|label| (label, self.get(label)))
    }
}

/// A successful analysis, exactly as the server reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: ClassLabel,
    /// Percent, 0-100.
    pub confidence: f64,
    pub all_probabilities: ClassProbabilities,
    pub message: String,
}

/// Raw `POST /predict` body. Validation failures come back as a bare
/// `{"error": ..}` without `success`, so it defaults to false.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub success: bool,
    pub prediction: Option<ClassLabel>,
    pub confidence: Option<f64>,
    pub all_probabilities: Option<ClassProbabilities>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl PredictResponse {
    /// Map the body onto the session outcome.
    pub fn into_outcome(self) -> Result<PredictionResult, AnalysisError> {
        if !self.success {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| PREDICTION_FAILED_MESSAGE.to_string());
            return Err(AnalysisError::ServerReported(message));
        }
        match (self.prediction, self.confidence, self.all_probabilities) {
            (Some(prediction), Some(confidence), Some(all_probabilities)) => Ok(PredictionResult {
                prediction,
                confidence,
                all_probabilities,
                message: self.message.unwrap_or_default(),
            }),
            _ => Err(AnalysisError::Transport(
                "success response without prediction fields".to_string(),
            )),
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.model_loaded
    }
}
