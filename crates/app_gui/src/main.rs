mod app;

use app::UiApp;
use eframe::{NativeOptions, egui};

fn main() {
    tracing_subscriber::fmt::init();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1040.0, 680.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "OncoVision",
        options,
        Box::new(|cc| Ok(Box::new(UiApp::new(cc)?))),
    ) {
        eprintln!("Application stopped with error: {e}");
    }
}
