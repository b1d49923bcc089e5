//! Chart Series Preparation
//! Pure data step shared by the interactive renderer and the static
//! exporter: aggregation, binning, grouping, and the color palette.

use crate::specs::{Aggregate, ChannelDef, ChartSpec, Mark};
use egui::Color32;
use polars::prelude::*;
use std::collections::HashMap;

/// Color palette for series
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(255, 87, 34),   // Deep Orange
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

pub fn series_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Scatter extraction stops after this many points; the overflow is
/// reported, never silently dropped.
pub const MAX_SCATTER_POINTS: usize = 5000;

const MIN_BINS: usize = 5;
const MAX_BINS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Bars,
    Points,
    Line,
    Area,
}

impl SeriesKind {
    fn of(mark: Mark) -> Self {
        match mark {
            Mark::Bar => SeriesKind::Bars,
            Mark::Point => SeriesKind::Points,
            Mark::Line => SeriesKind::Line,
            Mark::Area => SeriesKind::Area,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
    pub bar_width: f64,
}

#[derive(Debug, Clone)]
pub struct PreparedChart {
    pub kind: SeriesKind,
    pub series: Vec<ChartSeries>,
    /// Category labels for a discrete x axis.
    pub x_labels: Option<Vec<String>>,
    pub x_axis: String,
    pub y_axis: String,
    /// Points dropped by the scatter cap.
    pub truncated: usize,
}

impl PreparedChart {
    fn empty(kind: SeriesKind, x_axis: String, y_axis: String) -> Self {
        Self {
            kind,
            series: Vec::new(),
            x_labels: None,
            x_axis,
            y_axis,
            truncated: 0,
        }
    }
}

/// Turn `(spec, rows)` into drawable series.
pub fn prepare_chart(spec: &ChartSpec, rows: &DataFrame) -> PreparedChart {
    let kind = SeriesKind::of(spec.mark);
    let Some(x) = spec.encoding.x.as_ref() else {
        return PreparedChart::empty(kind, String::new(), String::new());
    };
    let y = spec.encoding.y.as_ref();
    let color = spec.encoding.color.as_ref();
    let x_axis = axis_label(x);
    let y_axis = y.map(describe_y).unwrap_or_default();

    if rows.height() == 0 {
        return PreparedChart::empty(kind, x_axis, y_axis);
    }

    if x.bin {
        prepare_binned(x, rows, kind, x_axis, y_axis)
    } else if is_discrete(x) {
        prepare_categorical(x, y, color, rows, kind, x_axis, y_axis)
    } else {
        prepare_xy(x, y, color, rows, kind, x_axis, y_axis)
    }
}

fn is_discrete(channel: &ChannelDef) -> bool {
    use crate::pattern::SemanticType;
    matches!(
        channel.semantic,
        SemanticType::Nominal | SemanticType::Ordinal | SemanticType::Temporal
    )
}

fn axis_label(channel: &ChannelDef) -> String {
    if channel.log_scale {
        format!("log10({})", channel.field)
    } else if channel.bin {
        format!("{} (binned)", channel.field)
    } else {
        channel.field.clone()
    }
}

fn describe_y(y: &ChannelDef) -> String {
    match y.aggregate {
        Some(Aggregate::Count) => "count".to_string(),
        Some(Aggregate::Mean) => format!("mean({})", y.field),
        Some(Aggregate::Sum) => format!("sum({})", y.field),
        None => axis_label(y),
    }
}

/// Stringified cell values of a column, `None` for nulls.
fn string_values(df: &DataFrame, field: &str) -> Vec<Option<String>> {
    let Ok(column) = df.column(field) else {
        return vec![None; df.height()];
    };
    let series = column.as_materialized_series();
    (0..series.len())
        .map(|i| {
            let val = series.get(i).ok()?;
            if val.is_null() {
                None
            } else {
                Some(val.to_string().trim_matches('"').to_string())
            }
        })
        .collect()
}

/// Numeric cell values of a column, `None` for nulls/NaN.
fn numeric_values(df: &DataFrame, field: &str) -> Vec<Option<f64>> {
    let values = df
        .column(field)
        .ok()
        .and_then(|col| col.cast(&DataType::Float64).ok())
        .and_then(|col| col.f64().ok().cloned());
    match values {
        Some(ca) => ca
            .into_iter()
            .map(|v| v.filter(|v| !v.is_nan()))
            .collect(),
        None => vec![None; df.height()],
    }
}

fn sorted_unique(values: &[Option<String>]) -> Vec<String> {
    let mut out: Vec<String> = values.iter().flatten().cloned().collect();
    out.sort();
    out.dedup();
    out
}

/// Categories on x, one bar group (or line point) per category, optionally
/// split into one series per color value.
fn prepare_categorical(
    x: &ChannelDef,
    y: Option<&ChannelDef>,
    color: Option<&ChannelDef>,
    rows: &DataFrame,
    kind: SeriesKind,
    x_axis: String,
    y_axis: String,
) -> PreparedChart {
    let xs = string_values(rows, &x.field);
    let categories = sorted_unique(&xs);
    if categories.is_empty() {
        return PreparedChart::empty(kind, x_axis, y_axis);
    }
    let category_index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let color_values = color.map(|c| string_values(rows, &c.field));
    let groups: Vec<String> = match &color_values {
        Some(values) => sorted_unique(values),
        None => vec![y_axis.clone()],
    };
    let group_index: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();

    let aggregate = y.and_then(|y| y.aggregate).unwrap_or(Aggregate::Count);
    let y_values = match aggregate {
        Aggregate::Count => None,
        _ => Some(numeric_values(rows, y.map(|y| y.field.as_str()).unwrap_or(""))),
    };

    // (category, group) -> (sum, n)
    let mut cells: HashMap<(usize, usize), (f64, usize)> = HashMap::new();
    for row in 0..rows.height() {
        let Some(cat) = xs[row].as_deref().and_then(|c| category_index.get(c)) else {
            continue;
        };
        let group = match &color_values {
            Some(values) => match values[row].as_deref().and_then(|g| group_index.get(g)) {
                Some(g) => *g,
                None => continue,
            },
            None => 0,
        };
        let value = match &y_values {
            Some(values) => match values[row] {
                Some(v) => v,
                None => continue,
            },
            None => 1.0,
        };
        let cell = cells.entry((*cat, group)).or_insert((0.0, 0));
        cell.0 += value;
        cell.1 += 1;
    }

    let group_count = groups.len();
    let slot = 0.8 / group_count as f64;
    let series = groups
        .iter()
        .enumerate()
        .map(|(g, name)| {
            let points = categories
                .iter()
                .enumerate()
                .filter_map(|(c, _)| {
                    let (sum, n) = cells.get(&(c, g)).copied()?;
                    let value = match aggregate {
                        Aggregate::Count => n as f64,
                        Aggregate::Sum => sum,
                        Aggregate::Mean => sum / n as f64,
                    };
                    // Grouped bars sit side by side around the category tick.
                    let offset = (g as f64 - (group_count as f64 - 1.0) / 2.0) * slot;
                    Some([c as f64 + offset, value])
                })
                .collect();
            ChartSeries {
                name: name.clone(),
                color: series_color(g),
                points,
                bar_width: slot * 0.9,
            }
        })
        .collect();

    PreparedChart {
        kind,
        series,
        x_labels: Some(categories),
        x_axis,
        y_axis,
        truncated: 0,
    }
}

/// Histogram: bin a measure, count per bin.
fn prepare_binned(
    x: &ChannelDef,
    rows: &DataFrame,
    kind: SeriesKind,
    x_axis: String,
    y_axis: String,
) -> PreparedChart {
    let mut values: Vec<f64> = numeric_values(rows, &x.field).into_iter().flatten().collect();
    if x.log_scale {
        let before = values.len();
        values.retain(|v| *v > 0.0);
        if values.len() < before {
            tracing::warn!(
                dropped = before - values.len(),
                field = %x.field,
                "non-positive values dropped from log-scaled histogram"
            );
        }
        values.iter_mut().for_each(|v| *v = v.log10());
    }
    if values.is_empty() {
        return PreparedChart::empty(kind, x_axis, y_axis);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        let series = ChartSeries {
            name: y_axis.clone(),
            color: series_color(0),
            points: vec![[min, values.len() as f64]],
            bar_width: 1.0,
        };
        return PreparedChart {
            kind,
            series: vec![series],
            x_labels: None,
            x_axis,
            y_axis,
            truncated: 0,
        };
    }

    let bins = ((values.len() as f64).sqrt().ceil() as usize).clamp(MIN_BINS, MAX_BINS);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let points = counts
        .iter()
        .enumerate()
        .map(|(i, &n)| [min + (i as f64 + 0.5) * width, n as f64])
        .collect();
    let series = ChartSeries {
        name: y_axis.clone(),
        color: series_color(0),
        points,
        bar_width: width * 0.95,
    };
    PreparedChart {
        kind,
        series: vec![series],
        x_labels: None,
        x_axis,
        y_axis,
        truncated: 0,
    }
}

/// Raw x/y pairs: scatter, line, or area, optionally split by color value.
fn prepare_xy(
    x: &ChannelDef,
    y: Option<&ChannelDef>,
    color: Option<&ChannelDef>,
    rows: &DataFrame,
    kind: SeriesKind,
    x_axis: String,
    y_axis: String,
) -> PreparedChart {
    let Some(y) = y else {
        return PreparedChart::empty(kind, x_axis, y_axis);
    };
    let xs = numeric_values(rows, &x.field);
    let ys = numeric_values(rows, &y.field);
    let color_values = color.map(|c| string_values(rows, &c.field));

    let mut by_group: HashMap<String, Vec<[f64; 2]>> = HashMap::new();
    let mut kept = 0usize;
    let mut truncated = 0usize;
    for row in 0..rows.height() {
        let (Some(mut px), Some(mut py)) = (xs[row], ys[row]) else {
            continue;
        };
        if x.log_scale {
            if px <= 0.0 {
                continue;
            }
            px = px.log10();
        }
        if y.log_scale {
            if py <= 0.0 {
                continue;
            }
            py = py.log10();
        }
        if kept >= MAX_SCATTER_POINTS {
            truncated += 1;
            continue;
        }
        kept += 1;
        let group = match &color_values {
            Some(values) => values[row].clone().unwrap_or_default(),
            None => y_axis.clone(),
        };
        by_group.entry(group).or_default().push([px, py]);
    }
    if truncated > 0 {
        tracing::warn!(truncated, "scatter point cap reached");
    }

    let mut names: Vec<String> = by_group.keys().cloned().collect();
    names.sort();
    let series = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut points = by_group.remove(&name).unwrap_or_default();
            if matches!(kind, SeriesKind::Line | SeriesKind::Area) {
                points.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));
            }
            ChartSeries {
                name,
                color: series_color(i),
                points,
                bar_width: 0.0,
            }
        })
        .collect();

    PreparedChart {
        kind,
        series,
        x_labels: None,
        x_axis,
        y_axis,
        truncated,
    }
}
