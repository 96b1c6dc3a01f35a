//! Settings panel for the server connection.

use super::UiApp;
use anyhow::{Context, Result};
use eframe::egui;
use onco_core::{ClientConfig, HttpPredictClient};
use std::sync::Arc;

impl UiApp {
    /// Renders the connection settings and version info.
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Analysis server");
            ui.text_edit_singleline(&mut self.pending_server_url);
        });
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Timeout (seconds)");
            ui.add(
                egui::DragValue::new(&mut self.pending_timeout_secs)
                    .range(1..=600)
                    .speed(1),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                match self.apply_settings() {
                    Ok(()) => {
                        self.status = "Settings saved".to_string();
                        let ctx = ui.ctx().clone();
                        self.check_health(&ctx);
                    }
                    Err(e) => {
                        tracing::warn!("settings rejected: {e:#}");
                        self.status = format!("Settings not saved: {e:#}");
                    }
                }
            }
            if ui.button("Check server").clicked() {
                let ctx = ui.ctx().clone();
                self.check_health(&ctx);
            }
            if ui.button("Revert").clicked() {
                self.pending_server_url = self.config.server_url.clone();
                self.pending_timeout_secs = self.config.timeout_secs;
            }
        });
        if let Some(path) = &self.config_path {
            ui.weak(format!("Stored in {}", path.display()));
        }

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(6.0);
        ui.heading("Version");
        ui.label(format!("App version: {}", self.app_version));
    }

    /// Validate the edited values, swap the client for later submissions and
    /// persist the config.
    fn apply_settings(&mut self) -> Result<()> {
        let config = ClientConfig {
            server_url: self.pending_server_url.trim().to_string(),
            timeout_secs: self.pending_timeout_secs,
        };
        config.validate()?;
        let client = HttpPredictClient::new(&config).context("could not create the HTTP client")?;
        if let Some(path) = &self.config_path {
            config.save(path)?;
        }
        self.controller.set_client(Arc::new(client));
        self.config = config;
        Ok(())
    }
}
