//! Top-level egui application: owns the intake and the analysis controller and
//! feeds them UI events.

mod results;
mod settings;
mod upload;

use anyhow::{Context, Result, bail};
use eframe::{App, Frame, egui};
use onco_core::intake::media_type_for_name;
use onco_core::preview::PreviewError;
use onco_core::{
    AnalysisController, CandidateFile, ClientConfig, Dispatch, FileIntake, HealthStatus,
    HttpPredictClient, IntakeSource, Preview, render_preview, submit_for_analysis,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const UPLOAD_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Analysis,
    Settings,
}

#[derive(Debug, Clone)]
enum ServerHealth {
    Unknown,
    Checking,
    Reachable(HealthStatus),
    Unreachable(String),
}

type PreviewMessage = (u64, Result<Preview, PreviewError>);

pub struct UiApp {
    panel: Panel,
    intake: FileIntake,
    controller: AnalysisController,
    config: ClientConfig,
    config_path: Option<PathBuf>,
    pending_server_url: String,
    pending_timeout_secs: u64,
    status: String,
    notice: Option<String>,
    preview_tx: Sender<PreviewMessage>,
    preview_rx: Receiver<PreviewMessage>,
    preview_texture: Option<(u64, egui::TextureHandle)>,
    health: ServerHealth,
    health_rx: Option<Receiver<Result<HealthStatus, String>>>,
    app_version: &'static str,
}

impl UiApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let config_path = ClientConfig::default_path();
        let mut status = String::new();
        let config = match config_path.as_ref().map(|p| ClientConfig::load_with_env(p)) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                tracing::warn!("config not loaded: {e:#}");
                status = format!("Settings not loaded, using defaults: {e:#}");
                ClientConfig::default()
            }
            None => ClientConfig::default(),
        };
        let client =
            HttpPredictClient::new(&config).context("could not create the HTTP client")?;
        let (preview_tx, preview_rx) = mpsc::channel();
        let mut controller = AnalysisController::new(Arc::new(client));
        let repaint = cc.egui_ctx.clone();
        controller.set_waker(Arc::new(move || repaint.request_repaint()));

        let mut app = Self {
            panel: Panel::Analysis,
            intake: FileIntake::new(),
            controller,
            pending_server_url: config.server_url.clone(),
            pending_timeout_secs: config.timeout_secs,
            config,
            config_path,
            status,
            notice: None,
            preview_tx,
            preview_rx,
            preview_texture: None,
            health: ServerHealth::Unknown,
            health_rx: None,
            app_version: env!("ONCO_VISION_VERSION"),
        };
        app.check_health(&cc.egui_ctx);
        Ok(app)
    }

    fn is_busy(&self) -> bool {
        self.controller.session().is_uploading()
    }

    /// Validate a picked or dropped file and, when accepted, start both the
    /// preview and the analysis.
    fn handle_candidate(
        &mut self,
        ctx: &egui::Context,
        candidate: CandidateFile,
        source: IntakeSource,
    ) {
        match submit_for_analysis(&mut self.intake, &mut self.controller, candidate, source) {
            Dispatch::Started { file, id } => {
                self.spawn_preview(ctx, file);
                self.status = format!("Analysis {id} started");
            }
            Dispatch::Rejected(reason) => self.notice = Some(reason.to_string()),
            Dispatch::Busy => {}
        }
    }

    fn spawn_preview(&self, ctx: &egui::Context, file: Arc<CandidateFile>) {
        let generation = self.intake.preview_generation();
        let tx = self.preview_tx.clone();
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name("preview".into())
            .spawn(move || {
                let _ = tx.send((generation, render_preview(&file)));
                ctx.request_repaint();
            });
        if let Err(e) = spawned {
            tracing::warn!("could not start preview worker: {e}");
        }
    }

    fn pick_file(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        match CandidateFile::from_path(&path) {
            Ok(candidate) => self.handle_candidate(ctx, candidate, IntakeSource::Picker),
            Err(e) => self.status = format!("Could not open file: {e:#}"),
        }
    }

    /// Forget the current result and selection.
    fn new_analysis(&mut self) {
        self.controller.reset();
        self.intake.clear();
        self.preview_texture = None;
        self.status.clear();
    }

    fn check_health(&mut self, ctx: &egui::Context) {
        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name("health-check".into())
            .spawn(move || {
                let outcome = HttpPredictClient::new(&config)
                    .and_then(|client| client.health())
                    .map_err(|e| e.to_string());
                let _ = tx.send(outcome);
                ctx.request_repaint();
            });
        match spawned {
            Ok(_) => {
                self.health = ServerHealth::Checking;
                self.health_rx = Some(rx);
            }
            Err(e) => tracing::warn!("could not start health check: {e}"),
        }
    }

    /// Drain results from background workers. All state changes happen here,
    /// on the UI thread.
    fn dispatch_background_events(&mut self, ctx: &egui::Context) {
        self.controller.poll();

        while let Ok((generation, outcome)) = self.preview_rx.try_recv() {
            match outcome {
                Ok(preview) => {
                    self.intake.complete_preview(generation, preview);
                }
                Err(e) => tracing::warn!("preview failed: {e}"),
            }
        }
        self.sync_preview_texture(ctx);

        if let Some(rx) = &self.health_rx
            && let Ok(outcome) = rx.try_recv()
        {
            self.health = match outcome {
                Ok(health) => ServerHealth::Reachable(health),
                Err(e) => {
                    tracing::warn!("health check failed: {e}");
                    ServerHealth::Unreachable(e)
                }
            };
            self.health_rx = None;
        }

        // Backstop for the controller's waker; keeps the spinner moving.
        if self.is_busy() {
            ctx.request_repaint_after(UPLOAD_POLL_INTERVAL);
        }
    }

    fn sync_preview_texture(&mut self, ctx: &egui::Context) {
        let generation = self.intake.preview_generation();
        match self.intake.preview() {
            None => self.preview_texture = None,
            Some(preview) => {
                if matches!(&self.preview_texture, Some((g, _)) if *g == generation) {
                    return;
                }
                let size = [preview.width as usize, preview.height as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, &preview.rgba);
                let tex = ctx.load_texture("preview", color, egui::TextureOptions::LINEAR);
                self.preview_texture = Some((generation, tex));
            }
        }
    }

    /// Translate window-level drag and drop into intake events.
    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.first().cloned(),
            )
        });
        if hovering && !self.is_busy() {
            if self.intake.is_drag_active() {
                self.intake.drag_over();
            } else {
                self.intake.drag_enter();
            }
        } else if self.intake.is_drag_active() {
            self.intake.drag_leave();
        }

        let Some(dropped) = dropped else {
            return;
        };
        match candidate_from_drop(&dropped) {
            Ok(candidate) => self.handle_candidate(ctx, candidate, IntakeSource::Drop),
            Err(e) => {
                self.intake.drag_leave();
                self.status = format!("Could not read dropped file: {e:#}");
            }
        }
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notice.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(notice);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.notice = None;
                }
            });
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("OncoVision");
            ui.separator();
            ui.selectable_value(&mut self.panel, Panel::Analysis, "Analysis");
            ui.selectable_value(&mut self.panel, Panel::Settings, "Settings");
            ui.separator();
            self.render_health_badge(ui);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("New analysis").clicked() {
                    self.new_analysis();
                }
                if !self.status.is_empty() {
                    ui.label(&self.status);
                }
            });
        });
    }

    fn render_health_badge(&self, ui: &mut egui::Ui) {
        match &self.health {
            ServerHealth::Unknown => {
                ui.weak("Server: unknown");
            }
            ServerHealth::Checking => {
                ui.spinner();
                ui.weak("Checking server...");
            }
            ServerHealth::Reachable(health) if health.is_ready() => {
                ui.colored_label(egui::Color32::from_rgb(0x22, 0xc5, 0x5e), "Server ready");
            }
            ServerHealth::Reachable(health) => {
                ui.colored_label(
                    egui::Color32::from_rgb(0xf5, 0x9e, 0x0b),
                    format!("Server up, model not loaded ({})", health.status),
                );
            }
            ServerHealth::Unreachable(e) => {
                ui.colored_label(egui::Color32::from_rgb(0xef, 0x44, 0x44), "Server unreachable")
                    .on_hover_text(e);
            }
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.dispatch_background_events(ctx);
        self.handle_drag_and_drop(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_top_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.panel {
            Panel::Analysis => {
                ui.columns(2, |cols| {
                    self.render_upload_card(&mut cols[0]);
                    self.render_results_card(&mut cols[1]);
                });
            }
            Panel::Settings => self.render_settings_panel(ui),
        });

        self.render_notice(ctx);
    }
}

/// Build a candidate from a dropped file. Native drops carry a path; web drops
/// carry bytes and a browser-declared media type.
fn candidate_from_drop(file: &egui::DroppedFile) -> Result<CandidateFile> {
    if let Some(bytes) = &file.bytes {
        let media_type = if file.mime.is_empty() {
            media_type_for_name(&file.name).to_string()
        } else {
            file.mime.clone()
        };
        return Ok(CandidateFile::new(
            file.name.clone(),
            media_type,
            bytes.to_vec(),
        ));
    }
    if let Some(path) = &file.path {
        return CandidateFile::from_path(path);
    }
    bail!("dropped item has neither a path nor content")
}
