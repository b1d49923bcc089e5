//! Static Chart Export
//! Renders the current chart to a PNG file with plotters.

use crate::charts::series::{prepare_chart, ChartSeries, SeriesKind};
use crate::specs::ChartSpec;
use anyhow::{anyhow, Result};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::path::Path;

const MARGIN: i32 = 12;
const LABEL_AREA: i32 = 44;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `(spec, rows)` into a PNG at `path`.
    pub fn render_png(spec: &ChartSpec, rows: &DataFrame, path: &Path) -> Result<()> {
        let width = spec.width.unwrap_or(800.0).clamp(320.0, 2400.0) as u32 + 2 * LABEL_AREA as u32;
        let height =
            spec.height.unwrap_or(600.0).clamp(240.0, 1800.0) as u32 + 2 * LABEL_AREA as u32;
        Self::draw(spec, rows, path, width, height)
            .map_err(|e| anyhow!("chart export failed: {e}"))
    }

    fn draw(
        spec: &ChartSpec,
        rows: &DataFrame,
        path: &Path,
        width: u32,
        height: u32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let prepared = prepare_chart(spec, rows);
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        if prepared.series.is_empty() {
            root.draw(&Text::new(
                "No rows match",
                (width as i32 / 2 - 40, height as i32 / 2),
                ("sans-serif", 18),
            ))?;
            root.present()?;
            return Ok(());
        }

        let (x_range, y_range) = plot_ranges(&prepared);
        let title = format!("{} by {}", prepared.y_axis, prepared.x_axis);

        let mut chart = ChartBuilder::on(&root)
            .margin(MARGIN)
            .x_label_area_size(LABEL_AREA)
            .y_label_area_size(LABEL_AREA)
            .caption(title, ("sans-serif", 20))
            .build_cartesian_2d(x_range, y_range)?;

        let labels = prepared.x_labels.clone();
        chart
            .configure_mesh()
            .x_desc(prepared.x_axis.clone())
            .y_desc(prepared.y_axis.clone())
            .x_label_formatter(&|x| match &labels {
                Some(labels) => {
                    let idx = x.round();
                    if (x - idx).abs() < 0.25 && idx >= 0.0 {
                        labels.get(idx as usize).cloned().unwrap_or_default()
                    } else {
                        String::new()
                    }
                }
                None => format!("{x:.1}"),
            })
            .draw()?;

        for series in &prepared.series {
            Self::draw_series(&mut chart, prepared.kind, series)?;
        }

        if prepared.series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_series(
        chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
        kind: SeriesKind,
        series: &ChartSeries,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let color = RGBColor(series.color.r(), series.color.g(), series.color.b());
        let name = series.name.clone();

        match kind {
            SeriesKind::Bars => {
                let half = series.bar_width / 2.0;
                chart
                    .draw_series(series.points.iter().map(|p| {
                        Rectangle::new([(p[0] - half, 0.0), (p[0] + half, p[1])], color.filled())
                    }))?
                    .label(name)
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                    });
            }
            SeriesKind::Points => {
                chart
                    .draw_series(
                        series
                            .points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), 3, color.filled())),
                    )?
                    .label(name)
                    .legend(move |(x, y)| Circle::new((x + 5, y), 3, color.filled()));
            }
            SeriesKind::Line => {
                chart
                    .draw_series(LineSeries::new(
                        series.points.iter().map(|p| (p[0], p[1])),
                        color.stroke_width(2),
                    ))?
                    .label(name)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(2))
                    });
            }
            SeriesKind::Area => {
                chart
                    .draw_series(AreaSeries::new(
                        series.points.iter().map(|p| (p[0], p[1])),
                        0.0,
                        color.mix(0.35),
                    ))?
                    .label(name)
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.mix(0.35).filled())
                    });
            }
        }
        Ok(())
    }
}

fn plot_ranges(prepared: &crate::charts::series::PreparedChart) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut pad: f64 = 0.5;
    for series in &prepared.series {
        pad = pad.max(series.bar_width);
        for p in &series.points {
            x_min = x_min.min(p[0]);
            x_max = x_max.max(p[0]);
            y_min = y_min.min(p[1]);
            y_max = y_max.max(p[1]);
        }
    }
    if (x_max - x_min).abs() < f64::EPSILON {
        x_max = x_min + 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_max = y_min + 1.0;
    }
    let x_pad = ((x_max - x_min) * 0.05).max(pad);
    let y_pad = (y_max - y_min) * 0.05;
    // Bars and areas are anchored at the zero baseline.
    let y_start = if matches!(prepared.kind, SeriesKind::Bars | SeriesKind::Area) {
        y_min.min(0.0)
    } else {
        y_min - y_pad
    };
    ((x_min - x_pad)..(x_max + x_pad), y_start..(y_max + y_pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::series::PreparedChart;
    use egui::Color32;

    #[test]
    fn bar_ranges_include_zero_and_pad_x() {
        let prepared = PreparedChart {
            kind: SeriesKind::Bars,
            series: vec![ChartSeries {
                name: "count".into(),
                color: Color32::WHITE,
                points: vec![[0.0, 3.0], [1.0, 5.0]],
                bar_width: 0.7,
            }],
            x_labels: Some(vec!["a".into(), "b".into()]),
            x_axis: "x".into(),
            y_axis: "count".into(),
            truncated: 0,
        };
        let (x, y) = plot_ranges(&prepared);
        assert!(x.start < 0.0 && x.end > 1.0);
        assert!(y.start <= 0.0);
        assert!(y.end >= 5.0);
    }
}
