//! Text and colour helpers for presenting a prediction.

use crate::prediction::{ClassLabel, PredictionResult};

const TTA_ANNOTATION: &str = "(TTA enhanced)";

/// `97.3%`
pub fn format_confidence(confidence: f64) -> String {
    format!("{confidence:.1}%")
}

/// `97%`
pub fn format_probability(probability: f64) -> String {
    format!("{probability:.0}%")
}

/// Server message without the augmentation annotation.
pub fn display_message(message: &str) -> String {
    message.replace(TTA_ANNOTATION, "").trim().to_string()
}

/// Width of a probability bar in `[0, 1]`. Only the bar is clamped.
pub fn bar_fraction(probability: f64) -> f32 {
    if probability.is_nan() {
        return 0.0;
    }
    (probability.clamp(0.0, 100.0) / 100.0) as f32
}

/// Accent colour per class as RGB.
pub fn accent_rgb(label: ClassLabel) -> [u8; 3] {
    match label {
        ClassLabel::Benign => [0x22, 0xc5, 0x5e],
        ClassLabel::Malignant => [0xef, 0x44, 0x44],
        ClassLabel::Normal => [0x3b, 0x82, 0xf6],
    }
}

/// One-line summary for the clipboard.
pub fn summary_line(result: &PredictionResult) -> String {
    let breakdown = result
        .all_probabilities
        .iter()
        .map(|(label, p)| format!("{label} {}", format_probability(p)))
        .collect::<Vec<_>>()
        .join(", ");
    let message = display_message(&result.message);
    if message.is_empty() {
        format!(
            "{} ({}) | {breakdown}",
            result.prediction,
            format_confidence(result.confidence)
        )
    } else {
        format!(
            "{} ({}) | {breakdown} | {message}",
            result.prediction,
            format_confidence(result.confidence)
        )
    }
}
