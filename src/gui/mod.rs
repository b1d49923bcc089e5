//! GUI module - User interface components

mod app;
pub mod canvas;
mod pattern_panel;
pub mod toolbar;

pub use app::PatternLensApp;
pub use canvas::MainCanvas;
pub use pattern_panel::{PatternPanel, PatternPanelAction};
