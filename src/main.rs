//! PatternLens - CSV pattern explorer & interactive chart viewer
//!
//! Load a CSV, pin a pattern (fields + filters), and the canvas derives and
//! renders a chart for it.

mod charts;
mod data;
mod gui;
mod pattern;
mod specs;
mod stats;
mod store;

use eframe::egui;
use gui::PatternLensApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("PatternLens"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "PatternLens",
        options,
        Box::new(|cc| Ok(Box::new(PatternLensApp::new(cc)))),
    )
}
