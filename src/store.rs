//! Global settings store.
//!
//! Plain single-threaded state: the UI reads it every frame and mutates it
//! through small operations. The dataset is held behind an `Arc` so derived
//! values can be memoized on pointer identity.

use crate::pattern::Pattern;
use polars::prelude::DataFrame;
use std::sync::Arc;

/// Which spec builder drives the main canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizAlgo {
    Lite,
    Rich,
}

impl VizAlgo {
    pub fn key(self) -> &'static str {
        match self {
            VizAlgo::Lite => "lite",
            VizAlgo::Rich => "rich",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "lite" => Some(VizAlgo::Lite),
            "rich" => Some(VizAlgo::Rich),
            _ => None,
        }
    }
}

/// How the main chart is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Chart fits its container.
    Auto,
    /// User-driven manual sizing.
    Control,
}

impl ResizeMode {
    pub fn key(self) -> &'static str {
        match self {
            ResizeMode::Auto => "auto",
            ResizeMode::Control => "control",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "auto" => Some(ResizeMode::Auto),
            "control" => Some(ResizeMode::Control),
            _ => None,
        }
    }
}

/// Pixel dimensions plus the sizing mode of the main chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSetting {
    pub mode: ResizeMode,
    pub width: f32,
    pub height: f32,
}

impl Default for ResizeSetting {
    fn default() -> Self {
        Self {
            mode: ResizeMode::Auto,
            width: 400.0,
            height: 300.0,
        }
    }
}

/// Settings of the main visualization canvas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MainVizSettings {
    pub resize: ResizeSetting,
    pub debug: bool,
    pub interactive: bool,
}

/// Application state shared by the toolbar, panels, and canvas.
pub struct VizStore {
    pub viz_algo: VizAlgo,
    pub main_viz: MainVizSettings,
    pub dataset: Option<Arc<DataFrame>>,
    pub pinned: Option<Pattern>,
}

impl Default for VizStore {
    fn default() -> Self {
        Self {
            viz_algo: VizAlgo::Lite,
            main_viz: MainVizSettings::default(),
            dataset: None,
            pinned: None,
        }
    }
}

impl VizStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an incremental change to the main viz settings.
    pub fn update_main_viz_settings(&mut self, mutate: impl FnOnce(&mut MainVizSettings)) {
        mutate(&mut self.main_viz);
    }

    /// Installs a freshly loaded dataset. A new `Arc` means a new identity,
    /// so every memoized derivation recomputes.
    pub fn set_dataset(&mut self, df: DataFrame) {
        self.dataset = Some(Arc::new(df));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_applies_mutator_incrementally() {
        let mut store = VizStore::new();
        store.main_viz.resize.width = 400.0;
        store.main_viz.resize.height = 300.0;

        store.update_main_viz_settings(|s| {
            s.resize.width += 15.0;
            s.resize.height += -5.0;
        });

        assert_eq!(store.main_viz.resize.width, 415.0);
        assert_eq!(store.main_viz.resize.height, 295.0);
    }

    #[test]
    fn mode_keys_round_trip() {
        for algo in [VizAlgo::Lite, VizAlgo::Rich] {
            assert_eq!(VizAlgo::from_key(algo.key()), Some(algo));
        }
        for mode in [ResizeMode::Auto, ResizeMode::Control] {
            assert_eq!(ResizeMode::from_key(mode.key()), Some(mode));
        }
        assert_eq!(VizAlgo::from_key("other"), None);
    }
}
