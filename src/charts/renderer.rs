//! Interactive Chart Renderer
//! Draws a declarative spec with egui_plot, including facet grids.

use crate::charts::series::{prepare_chart, ChartSeries, SeriesKind};
use crate::data::{apply_filter, loader};
use crate::pattern::PatternFilter;
use crate::specs::{ChannelDef, ChartSpec, FacetAxis};
use egui::{RichText, ScrollArea};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use polars::prelude::DataFrame;

/// Facet grids stop after this many panels; the overflow is labeled.
const FACET_CAP: usize = 12;

const MIN_PLOT_SIZE: f32 = 160.0;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render a spec over the filtered rows. `actions` exposes the debug
    /// affordances (context menu with spec JSON and row counts).
    pub fn show(ui: &mut egui::Ui, spec: &ChartSpec, rows: &DataFrame, actions: bool) {
        match spec.encoding.facet() {
            Some((facet, axis)) => {
                // Each panel renders the same spec minus the facet channel,
                // over its own row subset.
                let facet = facet.clone();
                let mut panel_spec = spec.clone();
                panel_spec.encoding.column = None;
                panel_spec.encoding.row = None;
                Self::show_facets(ui, &panel_spec, rows, actions, &facet, axis);
            }
            None => Self::show_single(ui, "main", spec, rows, actions),
        }
    }

    fn show_facets(
        ui: &mut egui::Ui,
        panel_spec: &ChartSpec,
        rows: &DataFrame,
        actions: bool,
        facet: &ChannelDef,
        axis: FacetAxis,
    ) {
        let values = loader::unique_values(rows, &facet.field);
        let shown = values.len().min(FACET_CAP);
        let hidden = values.len() - shown;
        if hidden > 0 {
            tracing::warn!(hidden, field = %facet.field, "facet panel cap reached");
        }

        let draw_panel = |ui: &mut egui::Ui, value: &str| {
            ui.vertical(|ui| {
                ui.label(RichText::new(format!("{} = {}", facet.field, value)).strong());
                let subset = Self::facet_rows(rows, &facet.field, value);
                Self::show_single(ui, value, panel_spec, &subset, actions);
            });
        };

        match axis {
            FacetAxis::Column => {
                ScrollArea::horizontal().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for value in &values[..shown] {
                            draw_panel(ui, value);
                            ui.add_space(8.0);
                        }
                    });
                });
            }
            FacetAxis::Row => {
                ScrollArea::vertical().show(ui, |ui| {
                    for value in &values[..shown] {
                        draw_panel(ui, value);
                        ui.add_space(8.0);
                    }
                });
            }
        }
        if hidden > 0 {
            ui.label(
                RichText::new(format!("+{hidden} more {} panels not shown", facet.field)).weak(),
            );
        }
    }

    fn facet_rows(rows: &DataFrame, field: &str, value: &str) -> DataFrame {
        apply_filter(rows, &[PatternFilter::one_of(field, vec![value.to_string()])])
            .unwrap_or_else(|e| {
                tracing::warn!(%field, error = %e, "facet subset failed");
                DataFrame::empty()
            })
    }

    fn show_single(
        ui: &mut egui::Ui,
        id_salt: &str,
        spec: &ChartSpec,
        rows: &DataFrame,
        actions: bool,
    ) {
        let prepared = prepare_chart(spec, rows);
        if prepared.series.is_empty() {
            ui.label(RichText::new("No rows match").weak());
            return;
        }

        let mut plot = Plot::new(("pattern-chart", id_salt))
            .allow_zoom(spec.interactive)
            .allow_drag(spec.interactive)
            .allow_scroll(false)
            .x_axis_label(prepared.x_axis.clone())
            .y_axis_label(prepared.y_axis.clone());

        if prepared.series.len() > 1 {
            plot = plot.legend(Legend::default());
        }
        plot = match spec.width {
            Some(w) => plot.width(w),
            None => plot.width(ui.available_width().max(MIN_PLOT_SIZE)),
        };
        plot = match spec.height {
            Some(h) => plot.height(h),
            None => plot.height((ui.available_height() - 8.0).max(MIN_PLOT_SIZE)),
        };
        if let Some(labels) = prepared.x_labels.clone() {
            plot = plot.x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (mark.value - idx).abs() < 0.25 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            });
        }

        let response = plot.show(ui, |plot_ui| {
            for series in &prepared.series {
                Self::draw_series(plot_ui, prepared.kind, series);
            }
        });

        if actions {
            response.response.context_menu(|ui| {
                if ui.button("Copy spec JSON").clicked() {
                    ui.ctx().copy_text(spec.to_json());
                    ui.close_menu();
                }
                ui.separator();
                ui.label(format!("{} rows", rows.height()));
                if prepared.truncated > 0 {
                    ui.label(format!("{} points over cap", prepared.truncated));
                }
            });
        }
    }

    fn draw_series(plot_ui: &mut egui_plot::PlotUi, kind: SeriesKind, series: &ChartSeries) {
        let points = PlotPoints::from_iter(series.points.iter().copied());
        match kind {
            SeriesKind::Bars => {
                let bars: Vec<Bar> = series
                    .points
                    .iter()
                    .map(|p| {
                        Bar::new(p[0], p[1])
                            .width(series.bar_width)
                            .fill(series.color)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(&series.name));
            }
            SeriesKind::Points => {
                plot_ui.points(
                    Points::new(points)
                        .radius(2.5)
                        .color(series.color)
                        .name(&series.name),
                );
            }
            SeriesKind::Line => {
                plot_ui.line(
                    Line::new(points)
                        .color(series.color)
                        .width(1.5)
                        .name(&series.name),
                );
            }
            SeriesKind::Area => {
                plot_ui.line(
                    Line::new(points)
                        .color(series.color)
                        .width(1.5)
                        .fill(0.0)
                        .name(&series.name),
                );
            }
        }
    }
}
