use super::UiApp;
use eframe::egui;
use onco_core::display::{
    accent_rgb, bar_fraction, display_message, format_confidence, format_probability,
    summary_line,
};
use onco_core::{PredictionResult, SessionStatus};

fn accent(label: onco_core::ClassLabel) -> egui::Color32 {
    let [r, g, b] = accent_rgb(label);
    egui::Color32::from_rgb(r, g, b)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl UiApp {
    pub(super) fn render_results_card(&mut self, ui: &mut egui::Ui) {
        ui.heading("2  Diagnosis");
        ui.add_space(8.0);

        let session = self.controller.session();
        let Some(result) = session.result().cloned() else {
            let (title, hint) = match session.status() {
                SessionStatus::Uploading => ("Analysing...", "Waiting for the server to respond."),
                SessionStatus::Failed => ("Analysis failed", "Choose another scan to try again."),
                SessionStatus::Idle | SessionStatus::Succeeded => (
                    "Awaiting Analysis",
                    "Upload an ultrasound scan to view the AI classification and probability metrics.",
                ),
            };
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.strong(title);
                ui.weak(hint);
            });
            return;
        };

        let request = session
            .last_request()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let received = session
            .completed_at()
            .map(|t| t.format("%H:%M:%S").to_string());
        self.render_result(ui, &result, &request, received.as_deref());
    }

    fn render_result(
        &mut self,
        ui: &mut egui::Ui,
        result: &PredictionResult,
        request: &str,
        received: Option<&str>,
    ) {
        let color = accent(result.prediction);
        ui.horizontal(|ui| {
            ui.colored_label(color, "DIAGNOSIS RESULT");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak(format!("ID: {request}"));
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.weak("Detected class");
                ui.heading(
                    egui::RichText::new(capitalize(result.prediction.as_str()))
                        .size(28.0)
                        .strong(),
                );
                ui.label(display_message(&result.message));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                ui.vertical(|ui| {
                    ui.weak("Confidence");
                    ui.heading(
                        egui::RichText::new(format_confidence(result.confidence))
                            .size(28.0)
                            .strong(),
                    );
                });
            });
        });

        ui.add_space(12.0);
        ui.columns(3, |cols| {
            for (col, (label, probability)) in cols.iter_mut().zip(result.all_probabilities.iter())
            {
                col.vertical_centered(|ui| {
                    ui.small(label.as_str().to_uppercase());
                    ui.strong(format_probability(probability));
                    ui.add(
                        egui::ProgressBar::new(bar_fraction(probability))
                            .fill(accent(label))
                            .desired_height(6.0),
                    );
                });
            }
        });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if let Some(received) = received {
                ui.weak(format!("Received {received}"));
            }
            if ui.button("Copy summary").clicked() {
                let summary = summary_line(result);
                match arboard::Clipboard::new().and_then(|mut c| c.set_text(summary)) {
                    Ok(()) => self.status = "Summary copied".to_string(),
                    Err(e) => {
                        tracing::warn!("clipboard unavailable: {e}");
                        self.status = format!("Could not copy summary: {e}");
                    }
                }
            }
        });
    }
}
