use std::path::Path;

use eframe::egui;
use temperatures_dashboard::app::TemperaturesApp;
use temperatures_dashboard::config::{CONFIG_FILE, DashboardConfig};

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Temperatures Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(TemperaturesApp::new(config)))),
    )
}
