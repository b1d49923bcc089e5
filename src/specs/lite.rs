//! Lightweight spec builder.
//! Derives a chart purely from the pattern's declared field semantics,
//! without touching the dataset.

use super::{frame_size, Aggregate, ChannelDef, ChartSpec, Encoding, Mark};
use crate::pattern::{Pattern, PatternField, SemanticType};
use crate::store::ResizeMode;

pub struct LiteSpecOptions<'a> {
    pub resize_mode: ResizeMode,
    pub width: f32,
    pub height: f32,
    pub pattern: &'a Pattern,
    pub interactive: bool,
}

/// Build a spec from declared semantics alone.
pub fn build_lite_spec(opts: &LiteSpecOptions) -> ChartSpec {
    let (width, height) = frame_size(opts.resize_mode, opts.width, opts.height);

    let measures: Vec<&PatternField> = opts
        .pattern
        .fields
        .iter()
        .filter(|f| f.semantic.is_measure())
        .collect();
    let dims: Vec<&PatternField> = opts
        .pattern
        .fields
        .iter()
        .filter(|f| !f.semantic.is_measure())
        .collect();

    let mut encoding = Encoding::default();
    let mut mark = Mark::Bar;
    let mut dims = dims.into_iter();

    match measures.len() {
        0 => {
            if let Some(dim) = dims.next() {
                // Category frequencies; counts over time read as an area.
                if dim.semantic == SemanticType::Temporal {
                    mark = Mark::Area;
                }
                encoding.x = Some(ChannelDef::field(&dim.name, dim.semantic));
                encoding.y =
                    Some(ChannelDef::field(&dim.name, SemanticType::Quantitative)
                        .aggregate(Aggregate::Count));
            }
        }
        1 => {
            let measure = measures[0];
            match dims.next() {
                None => {
                    // Distribution of a single measure.
                    encoding.x =
                        Some(ChannelDef::field(&measure.name, measure.semantic).binned());
                    encoding.y = Some(
                        ChannelDef::field(&measure.name, SemanticType::Quantitative)
                            .aggregate(Aggregate::Count),
                    );
                }
                Some(dim) => {
                    if dim.semantic == SemanticType::Temporal {
                        mark = Mark::Line;
                    }
                    encoding.x = Some(ChannelDef::field(&dim.name, dim.semantic));
                    encoding.y = Some(
                        ChannelDef::field(&measure.name, measure.semantic)
                            .aggregate(Aggregate::Mean),
                    );
                }
            }
        }
        _ => {
            mark = Mark::Point;
            encoding.x = Some(ChannelDef::field(&measures[0].name, measures[0].semantic));
            encoding.y = Some(ChannelDef::field(&measures[1].name, measures[1].semantic));
            if measures.len() > 2 {
                tracing::debug!(extra = measures.len() - 2, "ignoring extra measures");
            }
        }
    }

    if let Some(dim) = dims.next() {
        encoding.color = Some(ChannelDef::field(&dim.name, dim.semantic));
    }
    if let Some(dim) = dims.next() {
        encoding.column = Some(ChannelDef::field(&dim.name, dim.semantic));
    }
    let leftover = dims.count();
    if leftover > 0 {
        tracing::debug!(extra = leftover, "ignoring extra dimensions");
    }

    ChartSpec {
        width,
        height,
        mark,
        encoding,
        interactive: opts.interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternField;

    fn field(name: &str, semantic: SemanticType) -> PatternField {
        PatternField::new(name, semantic)
    }

    fn build(pattern: &Pattern, mode: ResizeMode, interactive: bool) -> ChartSpec {
        build_lite_spec(&LiteSpecOptions {
            resize_mode: mode,
            width: 400.0,
            height: 300.0,
            pattern,
            interactive,
        })
    }

    #[test]
    fn single_measure_becomes_binned_histogram() {
        let pattern = Pattern::new(vec![field("price", SemanticType::Quantitative)], vec![]);
        let spec = build(&pattern, ResizeMode::Auto, true);

        assert_eq!(spec.mark, Mark::Bar);
        let x = spec.encoding.x.as_ref().unwrap();
        assert!(x.bin);
        assert_eq!(x.field, "price");
        assert_eq!(
            spec.encoding.y.as_ref().unwrap().aggregate,
            Some(Aggregate::Count)
        );
        assert!(spec.interactive);
        assert_eq!(spec.width, None);
        assert_eq!(spec.height, None);
    }

    #[test]
    fn control_mode_pins_dimensions() {
        let pattern = Pattern::new(vec![field("price", SemanticType::Quantitative)], vec![]);
        let spec = build(&pattern, ResizeMode::Control, false);
        assert_eq!(spec.width, Some(400.0));
        assert_eq!(spec.height, Some(300.0));
    }

    #[test]
    fn two_measures_become_scatter() {
        let pattern = Pattern::new(
            vec![
                field("price", SemanticType::Quantitative),
                field("area", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, ResizeMode::Auto, false);
        assert_eq!(spec.mark, Mark::Point);
        assert_eq!(spec.encoding.x.as_ref().unwrap().field, "price");
        assert_eq!(spec.encoding.y.as_ref().unwrap().field, "area");
    }

    #[test]
    fn dimension_and_measure_aggregate_mean() {
        let pattern = Pattern::new(
            vec![
                field("city", SemanticType::Nominal),
                field("price", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, ResizeMode::Auto, false);
        assert_eq!(spec.mark, Mark::Bar);
        assert_eq!(spec.encoding.x.as_ref().unwrap().field, "city");
        let y = spec.encoding.y.as_ref().unwrap();
        assert_eq!(y.field, "price");
        assert_eq!(y.aggregate, Some(Aggregate::Mean));
    }

    #[test]
    fn temporal_axis_switches_mark_to_line() {
        let pattern = Pattern::new(
            vec![
                field("day", SemanticType::Temporal),
                field("price", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, ResizeMode::Auto, false);
        assert_eq!(spec.mark, Mark::Line);
    }

    #[test]
    fn third_dimension_becomes_column_facet() {
        let pattern = Pattern::new(
            vec![
                field("city", SemanticType::Nominal),
                field("kind", SemanticType::Nominal),
                field("year", SemanticType::Ordinal),
            ],
            vec![],
        );
        let spec = build(&pattern, ResizeMode::Auto, false);
        assert_eq!(spec.encoding.color.as_ref().unwrap().field, "kind");
        assert_eq!(spec.encoding.column.as_ref().unwrap().field, "year");
        assert!(spec.encoding.has_facet());
    }

    #[test]
    fn empty_pattern_yields_total_default_spec() {
        let pattern = Pattern::default();
        let spec = build(&pattern, ResizeMode::Auto, false);
        assert_eq!(spec.mark, Mark::Bar);
        assert!(spec.encoding.x.is_none());
        assert!(!spec.encoding.has_facet());
    }
}
