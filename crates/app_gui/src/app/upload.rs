//! Upload card: drop surface, file picker and preview.

use super::UiApp;
use eframe::egui;

const PREVIEW_HEIGHT: f32 = 256.0;

impl UiApp {
    pub(super) fn render_upload_card(&mut self, ui: &mut egui::Ui) {
        ui.heading("1  Upload scan");
        ui.add_space(8.0);

        let busy = self.is_busy();
        let stroke_color = if self.intake.is_drag_active() {
            egui::Color32::from_rgb(0x3b, 0x82, 0xf6)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };

        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .corner_radius(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_min_height(PREVIEW_HEIGHT);
                ui.vertical_centered(|ui| {
                    if let Some((_, tex)) = &self.preview_texture {
                        ui.add(
                            egui::Image::new(tex)
                                .max_height(PREVIEW_HEIGHT)
                                .maintain_aspect_ratio(true),
                        );
                    } else if let Some(file) = self.intake.current() {
                        ui.add_space(PREVIEW_HEIGHT / 3.0);
                        ui.label(file.name());
                    } else {
                        ui.add_space(PREVIEW_HEIGHT / 3.0);
                        ui.strong("Upload Ultrasound");
                        ui.weak("Drop a file here or choose one. PNG, JPG up to 10MB");
                    }

                    ui.add_space(8.0);
                    if busy {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Processing...");
                        });
                    } else {
                        ui.horizontal(|ui| {
                            if ui.button("Choose file...").clicked() {
                                let ctx = ui.ctx().clone();
                                self.pick_file(&ctx);
                            }
                            if self.intake.current().is_some()
                                && ui.button("Remove image").clicked()
                            {
                                self.intake.clear();
                                self.preview_texture = None;
                            }
                        });
                    }
                });
            });

        if let Some(message) = self.controller.session().error_message() {
            ui.add_space(12.0);
            egui::Frame::new()
                .fill(egui::Color32::from_rgb(0xfe, 0xf2, 0xf2))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(0xfe, 0xca, 0xca)))
                .corner_radius(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.colored_label(egui::Color32::from_rgb(0xb9, 0x1c, 0x1c), message);
                });
        }
    }
}
