//! Charts module - series preparation and rendering

pub mod export;
pub mod renderer;
pub mod series;

pub use export::StaticChartRenderer;
pub use renderer::ChartRenderer;
