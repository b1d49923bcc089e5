//! Main Chart Canvas
//! Derives the pinned pattern's row subset and chart spec from the store,
//! memoized on input identity, and renders, optionally inside a manually
//! resizable container.

use crate::charts::ChartRenderer;
use crate::data::apply_filter;
use crate::pattern::Pattern;
use crate::specs::{build_lite_spec, build_rich_spec, ChartSpec, LiteSpecOptions, RichSpecOptions};
use crate::store::{MainVizSettings, ResizeMode, ResizeSetting, VizAlgo, VizStore};
use egui::{vec2, RichText, Sense, Shape, Stroke, Vec2};
use polars::prelude::{DataFrame, PolarsResult};
use std::sync::Arc;

/// Extra room the resizable container adds around the chart, per axis.
pub const RESIZE_PADDING: f32 = 20.0;

const HANDLE_SIZE: f32 = 14.0;
const RESIZE_BORDER: egui::Color32 = egui::Color32::from_rgb(24, 144, 255);

// Both caches keep the dataset `Arc` alive so its address cannot be reused
// by a newer dataset; identity stays pointer equality.
struct RowsCache {
    dataset: Arc<DataFrame>,
    pattern: Pattern,
    rows: Arc<DataFrame>,
}

#[derive(Clone, PartialEq)]
struct SpecKey {
    algo: VizAlgo,
    resize: ResizeSetting,
    interactive: bool,
    pattern: Pattern,
}

struct SpecCache {
    dataset: Arc<DataFrame>,
    key: SpecKey,
    spec: ChartSpec,
}

pub struct MainCanvas {
    rows_cache: Option<RowsCache>,
    spec_cache: Option<SpecCache>,
    /// Accumulated drag delta of an in-flight resize.
    pending_resize: Vec2,
    #[cfg(test)]
    pub(crate) filter_calls: usize,
}

impl Default for MainCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MainCanvas {
    pub fn new() -> Self {
        Self {
            rows_cache: None,
            spec_cache: None,
            pending_resize: Vec2::ZERO,
            #[cfg(test)]
            filter_calls: 0,
        }
    }

    /// Rows the pinned pattern refers to. Recomputed only when the dataset
    /// identity or the pattern changes.
    pub(crate) fn filtered_rows(
        &mut self,
        dataset: &Arc<DataFrame>,
        pattern: &Pattern,
    ) -> PolarsResult<Arc<DataFrame>> {
        if let Some(cache) = &self.rows_cache {
            if Arc::ptr_eq(&cache.dataset, dataset) && cache.pattern == *pattern {
                return Ok(Arc::clone(&cache.rows));
            }
        }
        #[cfg(test)]
        {
            self.filter_calls += 1;
        }
        let rows = Arc::new(apply_filter(dataset, &pattern.filters)?);
        self.rows_cache = Some(RowsCache {
            dataset: Arc::clone(dataset),
            pattern: pattern.clone(),
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }

    /// Chart spec for the current inputs, memoized on everything that can
    /// change the result.
    pub(crate) fn derived_spec(
        &mut self,
        algo: VizAlgo,
        main_viz: &MainVizSettings,
        pattern: &Pattern,
        dataset: &Arc<DataFrame>,
    ) -> ChartSpec {
        let key = SpecKey {
            algo,
            resize: main_viz.resize.clone(),
            interactive: main_viz.interactive,
            pattern: pattern.clone(),
        };
        if let Some(cache) = &self.spec_cache {
            if Arc::ptr_eq(&cache.dataset, dataset) && cache.key == key {
                return cache.spec.clone();
            }
        }
        let resize = &main_viz.resize;
        let spec = match algo {
            VizAlgo::Lite => build_lite_spec(&LiteSpecOptions {
                resize_mode: resize.mode,
                width: resize.width,
                height: resize.height,
                pattern,
                interactive: main_viz.interactive,
            }),
            VizAlgo::Rich => build_rich_spec(&RichSpecOptions {
                resize_mode: resize.mode,
                width: resize.width,
                height: resize.height,
                pattern,
                dataset,
            }),
        };
        self.spec_cache = Some(SpecCache {
            dataset: Arc::clone(dataset),
            key,
            spec: spec.clone(),
        });
        spec
    }

    /// Manual resizing applies only in control mode, and never to faceted
    /// charts: panels manage their own layout.
    pub fn resize_enabled(mode: ResizeMode, spec: &ChartSpec) -> bool {
        mode == ResizeMode::Control && !spec.encoding.has_facet()
    }

    /// Incremental commit: composes with any external size change that
    /// happened mid-drag instead of clobbering it.
    pub fn apply_resize_delta(setting: &mut ResizeSetting, delta: Vec2) {
        setting.width += delta.x;
        setting.height += delta.y;
    }

    /// The chart last derived, for the export action.
    pub fn current_chart(&self) -> Option<(&ChartSpec, &Arc<DataFrame>)> {
        match (&self.spec_cache, &self.rows_cache) {
            (Some(spec), Some(rows)) => Some((&spec.spec, &rows.rows)),
            _ => None,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, store: &mut VizStore) -> PolarsResult<()> {
        let (Some(dataset), Some(pattern)) = (store.dataset.clone(), store.pinned.clone()) else {
            let hint = if store.dataset.is_none() {
                "No data loaded"
            } else {
                "No pattern pinned"
            };
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(hint).size(20.0));
            });
            return Ok(());
        };

        let rows = self.filtered_rows(&dataset, &pattern)?;
        let spec = self.derived_spec(store.viz_algo, &store.main_viz, &pattern, &dataset);
        let debug = store.main_viz.debug;

        if Self::resize_enabled(store.main_viz.resize.mode, &spec) {
            self.show_resizable(ui, store, &spec, &rows, debug);
        } else {
            ChartRenderer::show(ui, &spec, &rows, debug);
        }
        Ok(())
    }

    fn show_resizable(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut VizStore,
        spec: &ChartSpec,
        rows: &DataFrame,
        debug: bool,
    ) {
        let resize = store.main_viz.resize.clone();
        let size = vec2(
            resize.width + RESIZE_PADDING + self.pending_resize.x,
            resize.height + RESIZE_PADDING + self.pending_resize.y,
        );
        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());

        let inner = rect.shrink(RESIZE_PADDING / 2.0);
        ui.allocate_new_ui(egui::UiBuilder::new().max_rect(inner), |ui| {
            ChartRenderer::show(ui, spec, rows, debug);
        });

        // Dashed outline; previews the pending size while dragging.
        let stroke = Stroke::new(2.0, RESIZE_BORDER);
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ];
        for i in 0..4 {
            ui.painter().extend(Shape::dashed_line(
                &[corners[i], corners[(i + 1) % 4]],
                stroke,
                6.0,
                4.0,
            ));
        }

        let handle = egui::Rect::from_min_max(
            rect.right_bottom() - vec2(HANDLE_SIZE, HANDLE_SIZE),
            rect.right_bottom(),
        );
        let response = ui
            .interact(handle, ui.id().with("canvas-resize"), Sense::drag())
            .on_hover_cursor(egui::CursorIcon::ResizeNwSe);
        if response.dragged() {
            self.pending_resize += response.drag_delta();
        }
        if response.drag_stopped() {
            let delta = std::mem::take(&mut self.pending_resize);
            store.update_main_viz_settings(|s| Self::apply_resize_delta(&mut s.resize, delta));
        }
        for step in [4.0, 8.0, 12.0] {
            ui.painter().line_segment(
                [
                    rect.right_bottom() - vec2(step, 2.0),
                    rect.right_bottom() - vec2(2.0, step),
                ],
                Stroke::new(1.0, RESIZE_BORDER),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternField, PatternFilter, SemanticType};
    use crate::specs::{ChannelDef, Encoding, Mark};
    use polars::df;

    fn dataset() -> Arc<DataFrame> {
        Arc::new(
            df!(
                "city" => ["osaka", "kyoto", "osaka", "nara"],
                "price" => [120.0, 80.0, 60.0, 95.0],
            )
            .unwrap(),
        )
    }

    fn pattern() -> Pattern {
        Pattern::new(
            vec![PatternField::new("city", SemanticType::Nominal)],
            vec![PatternFilter::one_of("city", vec!["osaka".into()])],
        )
    }

    #[test]
    fn identical_inputs_do_not_reinvoke_the_filter() {
        let mut canvas = MainCanvas::new();
        let data = dataset();
        let pat = pattern();

        let first = canvas.filtered_rows(&data, &pat).unwrap();
        let second = canvas.filtered_rows(&data, &pat).unwrap();
        assert_eq!(canvas.filter_calls, 1);
        assert_eq!(first.height(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn pattern_change_recomputes_rows() {
        let mut canvas = MainCanvas::new();
        let data = dataset();
        canvas.filtered_rows(&data, &pattern()).unwrap();

        let other = Pattern::new(
            vec![PatternField::new("city", SemanticType::Nominal)],
            vec![PatternFilter::one_of("city", vec!["nara".into()])],
        );
        let rows = canvas.filtered_rows(&data, &other).unwrap();
        assert_eq!(canvas.filter_calls, 2);
        assert_eq!(rows.height(), 1);
    }

    #[test]
    fn new_dataset_identity_recomputes_rows() {
        let mut canvas = MainCanvas::new();
        let pat = pattern();
        let first = dataset();
        let second = dataset();
        canvas.filtered_rows(&first, &pat).unwrap();
        canvas.filtered_rows(&second, &pat).unwrap();
        assert_eq!(canvas.filter_calls, 2);
    }

    #[test]
    fn derived_spec_is_stable_until_inputs_change() {
        let mut canvas = MainCanvas::new();
        let data = dataset();
        let pat = pattern();
        let mut settings = MainVizSettings::default();
        settings.resize.mode = ResizeMode::Control;

        let a = canvas.derived_spec(VizAlgo::Lite, &settings, &pat, &data);
        let b = canvas.derived_spec(VizAlgo::Lite, &settings, &pat, &data);
        assert_eq!(a, b);
        assert_eq!(a.width, Some(settings.resize.width));

        settings.resize.width += 40.0;
        let c = canvas.derived_spec(VizAlgo::Lite, &settings, &pat, &data);
        assert_eq!(c.width, Some(settings.resize.width));
    }

    #[test]
    fn resize_requires_control_mode_and_no_facets() {
        let plain = ChartSpec {
            width: None,
            height: None,
            mark: Mark::Bar,
            encoding: Encoding::default(),
            interactive: false,
        };
        assert!(MainCanvas::resize_enabled(ResizeMode::Control, &plain));
        assert!(!MainCanvas::resize_enabled(ResizeMode::Auto, &plain));

        let mut faceted = plain.clone();
        faceted.encoding.column = Some(ChannelDef::field("kind", SemanticType::Nominal));
        assert!(!MainCanvas::resize_enabled(ResizeMode::Control, &faceted));

        let mut row_faceted = plain;
        row_faceted.encoding.row = Some(ChannelDef::field("kind", SemanticType::Nominal));
        assert!(!MainCanvas::resize_enabled(ResizeMode::Control, &row_faceted));
    }

    #[test]
    fn resize_delta_composes_incrementally() {
        let mut setting = ResizeSetting {
            mode: ResizeMode::Control,
            width: 400.0,
            height: 300.0,
        };
        MainCanvas::apply_resize_delta(&mut setting, vec2(15.0, -5.0));
        assert_eq!(setting.width, 415.0);
        assert_eq!(setting.height, 295.0);
    }
}
