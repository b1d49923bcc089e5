//! Specs module - declarative chart specifications and their builders.
//!
//! A `ChartSpec` describes a chart the way a grammar-of-graphics document
//! does: a mark plus an encoding map. The renderer consumes it together with
//! the filtered rows; it never looks back at the pattern.

mod lite;
mod rich;

pub use lite::{build_lite_spec, LiteSpecOptions};
pub use rich::{build_rich_spec, RichSpecOptions};

use crate::pattern::SemanticType;
use crate::store::ResizeMode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Point,
    Line,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Count,
    Mean,
    Sum,
}

/// One encoding channel: which field feeds it and how.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDef {
    pub field: String,
    #[serde(rename = "type")]
    pub semantic: SemanticType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    pub bin: bool,
    pub log_scale: bool,
}

impl ChannelDef {
    pub fn field(name: impl Into<String>, semantic: SemanticType) -> Self {
        Self {
            field: name.into(),
            semantic,
            aggregate: None,
            bin: false,
            log_scale: false,
        }
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn binned(mut self) -> Self {
        self.bin = true;
        self
    }

    pub fn log(mut self, on: bool) -> Self {
        self.log_scale = on;
        self
    }
}

/// Which axis a facet channel splits along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetAxis {
    Column,
    Row,
}

/// Encoding map. `column`/`row` split the chart into a grid of sub-charts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<ChannelDef>,
}

impl Encoding {
    /// Faceted charts manage their own multi-panel layout.
    pub fn has_facet(&self) -> bool {
        self.column.is_some() || self.row.is_some()
    }

    pub fn facet(&self) -> Option<(&ChannelDef, FacetAxis)> {
        if let Some(def) = &self.column {
            Some((def, FacetAxis::Column))
        } else {
            self.row.as_ref().map(|def| (def, FacetAxis::Row))
        }
    }
}

/// A complete declarative chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub mark: Mark,
    pub encoding: Encoding,
    pub interactive: bool,
}

impl ChartSpec {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}

/// Explicit dimensions only in manual-sizing mode; otherwise the chart fits
/// its container.
pub(crate) fn frame_size(mode: ResizeMode, width: f32, height: f32) -> (Option<f32>, Option<f32>) {
    match mode {
        ResizeMode::Control => (Some(width), Some(height)),
        ResizeMode::Auto => (None, None),
    }
}
