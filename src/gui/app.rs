//! PatternLens Main Application
//! Main window wiring the toolbar, pattern panel, and chart canvas together.

use crate::charts::StaticChartRenderer;
use crate::data::loader;
use crate::gui::toolbar::{
    self, ButtonItem, SelectButtonItem, ToolbarButton, ToolbarOption, ToolbarSelectButton,
};
use crate::gui::{MainCanvas, PatternPanel, PatternPanelAction};
use crate::pattern::SemanticType;
use crate::store::{ResizeMode, VizAlgo, VizStore};
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete {
        df: DataFrame,
        columns: Vec<(String, SemanticType)>,
        row_count: usize,
    },
    Error(String),
}

/// Main application window.
pub struct PatternLensApp {
    store: VizStore,
    panel: PatternPanel,
    canvas: MainCanvas,

    algo_select: ToolbarSelectButton,
    resize_select: ToolbarSelectButton,
    open_button: ToolbarButton,
    export_button: ToolbarButton,
    interactive_button: ToolbarButton,
    debug_button: ToolbarButton,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl PatternLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            store: VizStore::new(),
            panel: PatternPanel::new(),
            canvas: MainCanvas::new(),
            algo_select: ToolbarSelectButton::new(),
            resize_select: ToolbarSelectButton::new(),
            open_button: ToolbarButton::new(),
            export_button: ToolbarButton::new(),
            interactive_button: ToolbarButton::new(),
            debug_button: ToolbarButton::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    fn algo_item(&self) -> SelectButtonItem {
        SelectButtonItem {
            label: "Visualization engine".into(),
            icon: "⚙",
            disabled: false,
            options: vec![
                ToolbarOption::new("lite", "⚡", "Lite"),
                ToolbarOption::new("rich", "🔬", "Rich"),
            ],
            value: self.store.viz_algo.key().to_string(),
        }
    }

    fn resize_item(&self) -> SelectButtonItem {
        SelectButtonItem {
            label: "Chart sizing".into(),
            icon: "📐",
            disabled: false,
            options: vec![
                ToolbarOption::new("auto", "🔄", "Fit view"),
                ToolbarOption::new("control", "✋", "Manual"),
            ],
            value: self.store.main_viz.resize.mode.key().to_string(),
        }
    }

    /// Handle CSV file selection - loads on a background thread.
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.store.pinned = None;
            self.panel.csv_path = Some(path.clone());
            self.panel.set_progress(0.0, "Loading CSV file...");
            self.is_loading = true;

            let (tx, rx) = channel();
            self.load_rx = Some(rx);

            let path_str = path.to_string_lossy().to_string();

            thread::spawn(move || {
                let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));

                match loader::load_csv(&path_str) {
                    Ok(df) => {
                        let columns = loader::columns_with_semantics(&df);
                        let row_count = df.height();
                        let _ = tx.send(LoadResult::Complete {
                            df,
                            columns,
                            row_count,
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(LoadResult::Error(e.to_string()));
                    }
                }
            });
        }
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.panel.set_progress(0.0, &status);
                    }
                    LoadResult::Complete {
                        df,
                        columns,
                        row_count,
                    } => {
                        tracing::info!(rows = row_count, cols = columns.len(), "CSV loaded");
                        self.store.set_dataset(df);
                        self.panel.update_columns(columns.clone());
                        self.panel.set_progress(
                            100.0,
                            &format!("Loaded {} rows, {} columns", row_count, columns.len()),
                        );
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        tracing::warn!(%error, "CSV load failed");
                        self.panel.set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Handle PNG export of the current chart.
    fn handle_export_png(&mut self) {
        let Some((spec, rows)) = self.canvas.current_chart() else {
            self.panel.set_progress(0.0, "No chart to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name("patternlens_chart.png")
            .save_file()
        else {
            return; // User cancelled
        };

        match StaticChartRenderer::render_png(spec, rows, &path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "chart exported");
                self.panel
                    .set_progress(100.0, &format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    tracing::warn!(error = %e, "could not open exported file");
                }
            }
            Err(e) => {
                self.panel.set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        let algo_item = self.algo_item();
        let resize_item = self.resize_item();

        toolbar::toolbar_frame(ui, |ui| {
            if self.open_button.show(ui, &ButtonItem::new("Open CSV", "📂")) {
                self.handle_browse_csv();
            }
            let mut export_item = ButtonItem::new("Export chart as PNG", "📷");
            export_item.disabled = self.canvas.current_chart().is_none();
            if self.export_button.show(ui, &export_item) {
                self.handle_export_png();
            }

            toolbar::toolbar_splitter(ui);

            if let Some(key) = self.algo_select.show(ui, &algo_item) {
                if let Some(algo) = VizAlgo::from_key(&key) {
                    self.store.viz_algo = algo;
                }
            }
            if let Some(key) = self.resize_select.show(ui, &resize_item) {
                if let Some(mode) = ResizeMode::from_key(&key) {
                    self.store
                        .update_main_viz_settings(|s| s.resize.mode = mode);
                }
            }

            toolbar::toolbar_splitter(ui);

            let mut interactive_item = ButtonItem::new("Toggle chart interactions", "👆");
            interactive_item.active = self.store.main_viz.interactive;
            if self.interactive_button.show(ui, &interactive_item) {
                self.store
                    .update_main_viz_settings(|s| s.interactive = !s.interactive);
            }
            let mut debug_item = ButtonItem::new("Toggle debug actions", "🐛");
            debug_item.active = self.store.main_viz.debug;
            if self.debug_button.show(ui, &debug_item) {
                self.store.update_main_viz_settings(|s| s.debug = !s.debug);
            }
        });
    }
}

impl eframe::App for PatternLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.show_toolbar(ui);
        });

        // Left panel - pattern construction
        SidePanel::left("pattern_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let dataset = self.store.dataset.clone();
                    let action = self.panel.show(ui, dataset.as_deref());

                    match action {
                        PatternPanelAction::BrowseCsv => self.handle_browse_csv(),
                        PatternPanelAction::PinPattern => {
                            self.store.pinned = self.panel.build_pattern();
                            if let Some(pattern) = &self.store.pinned {
                                tracing::info!(
                                    fields = pattern.fields.len(),
                                    filters = pattern.filters.len(),
                                    "pattern pinned"
                                );
                            }
                        }
                        PatternPanelAction::ClearPattern => self.store.pinned = None,
                        PatternPanelAction::None => {}
                    }
                });
            });

        // Central panel - chart canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Err(e) = self.canvas.show(ui, &mut self.store) {
                tracing::warn!(error = %e, "row derivation failed");
                self.panel.set_progress(0.0, &format!("Error: {}", e));
            }
        });
    }
}
