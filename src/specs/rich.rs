//! Dataset-informed spec builder.
//! Same assignment skeleton as the lite builder, but field roles, scales,
//! and the color-vs-facet split are decided from observed data.

use super::{frame_size, Aggregate, ChannelDef, ChartSpec, Encoding, Mark};
use crate::pattern::{Pattern, SemanticType};
use crate::stats::{profile_fields, FieldProfile};
use crate::store::ResizeMode;
use polars::prelude::DataFrame;
use std::collections::HashMap;

/// Quantitative fields with at most this many distinct values plot better as
/// discrete categories.
const ORDINAL_CARDINALITY: usize = 8;
/// Above this many categories a color legend stops being readable.
const COLOR_CARDINALITY: usize = 6;

pub struct RichSpecOptions<'a> {
    pub resize_mode: ResizeMode,
    pub width: f32,
    pub height: f32,
    pub pattern: &'a Pattern,
    pub dataset: &'a DataFrame,
}

struct EffectiveField {
    name: String,
    semantic: SemanticType,
    log_scale: bool,
    distinct: Option<usize>,
}

fn effective_fields(
    pattern: &Pattern,
    profiles: &HashMap<String, FieldProfile>,
) -> Vec<EffectiveField> {
    pattern
        .fields
        .iter()
        .map(|f| {
            let profile = profiles.get(&f.name);
            let distinct = profile.map(|p| p.distinct);
            let mut semantic = f.semantic;
            if semantic == SemanticType::Quantitative {
                if let Some(d) = distinct {
                    if d > 0 && d <= ORDINAL_CARDINALITY {
                        semantic = SemanticType::Ordinal;
                    }
                }
            }
            let log_scale = semantic == SemanticType::Quantitative
                && profile.is_some_and(|p| p.wants_log_scale());
            EffectiveField {
                name: f.name.clone(),
                semantic,
                log_scale,
                distinct,
            }
        })
        .collect()
}

/// Build a spec with the full dataset available for inference.
pub fn build_rich_spec(opts: &RichSpecOptions) -> ChartSpec {
    let (width, height) = frame_size(opts.resize_mode, opts.width, opts.height);
    let profiles = profile_fields(opts.dataset, &opts.pattern.fields);
    let fields = effective_fields(opts.pattern, &profiles);

    let measures: Vec<&EffectiveField> = fields
        .iter()
        .filter(|f| f.semantic.is_measure())
        .collect();
    let dims: Vec<&EffectiveField> = fields
        .iter()
        .filter(|f| !f.semantic.is_measure())
        .collect();

    let mut encoding = Encoding::default();
    let mut mark = Mark::Bar;
    let mut dims = dims.into_iter();

    match measures.len() {
        0 => {
            if let Some(dim) = dims.next() {
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
                    encoding.x = Some(
                        ChannelDef::field(&measure.name, measure.semantic)
                            .binned()
                            .log(measure.log_scale),
                    );
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
                            .aggregate(Aggregate::Mean)
                            .log(measure.log_scale),
                    );
                }
            }
        }
        _ => {
            mark = Mark::Point;
            encoding.x = Some(
                ChannelDef::field(&measures[0].name, measures[0].semantic)
                    .log(measures[0].log_scale),
            );
            encoding.y = Some(
                ChannelDef::field(&measures[1].name, measures[1].semantic)
                    .log(measures[1].log_scale),
            );
            if measures.len() > 2 {
                tracing::debug!(extra = measures.len() - 2, "ignoring extra measures");
            }
        }
    }

    // Secondary dimensions: color while the legend stays readable, facet
    // otherwise. Panels stack vertically when x is dense.
    let x_is_quantitative = encoding
        .x
        .as_ref()
        .is_some_and(|x| x.semantic == SemanticType::Quantitative);
    let mut facet_taken = false;
    let mut ignored = 0usize;
    for dim in dims {
        let channel = ChannelDef::field(&dim.name, dim.semantic);
        let colorable =
            encoding.color.is_none() && dim.distinct.is_some_and(|d| d <= COLOR_CARDINALITY);
        if colorable {
            encoding.color = Some(channel);
        } else if !facet_taken {
            if x_is_quantitative {
                encoding.row = Some(channel);
            } else {
                encoding.column = Some(channel);
            }
            facet_taken = true;
        } else {
            ignored += 1;
        }
    }
    if ignored > 0 {
        tracing::debug!(extra = ignored, "ignoring extra dimensions");
    }

    ChartSpec {
        width,
        height,
        mark,
        encoding,
        interactive: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternField;
    use polars::df;

    fn build(pattern: &Pattern, df: &DataFrame) -> ChartSpec {
        build_rich_spec(&RichSpecOptions {
            resize_mode: ResizeMode::Auto,
            width: 400.0,
            height: 300.0,
            pattern,
            dataset: df,
        })
    }

    #[test]
    fn low_cardinality_measure_is_demoted_to_ordinal_axis() {
        let df = df!(
            "rating" => (0..12).map(|i| (i % 3 + 1) as f64).collect::<Vec<f64>>(),
            "price" => (0..12).map(|i| 10.0 + i as f64 * 2.7).collect::<Vec<f64>>(),
        )
        .unwrap();
        let pattern = Pattern::new(
            vec![
                PatternField::new("rating", SemanticType::Quantitative),
                PatternField::new("price", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, &df);

        // rating (3 distinct values) stops being a measure, so this is a
        // mean-per-category bar, not a scatter.
        assert_eq!(spec.mark, Mark::Bar);
        let x = spec.encoding.x.as_ref().unwrap();
        assert_eq!(x.field, "rating");
        assert_eq!(x.semantic, SemanticType::Ordinal);
        assert_eq!(
            spec.encoding.y.as_ref().unwrap().aggregate,
            Some(Aggregate::Mean)
        );
    }

    #[test]
    fn skewed_measure_gets_log_scale() {
        let mut values: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        values.extend([5000.0, 8000.0, 12000.0]);
        let df = df!("income" => values).unwrap();
        let pattern = Pattern::new(
            vec![PatternField::new("income", SemanticType::Quantitative)],
            vec![],
        );
        let spec = build(&pattern, &df);
        let x = spec.encoding.x.as_ref().unwrap();
        assert!(x.bin);
        assert!(x.log_scale);
    }

    #[test]
    fn narrow_dimension_colors_wide_dimension_facets() {
        let narrow: Vec<String> = (0..12).map(|i| format!("k{}", i % 2)).collect();
        let wide: Vec<String> = (0..12).map(|i| format!("city{i}")).collect();
        let df = df!(
            "city" => wide.clone(),
            "kind" => narrow.clone(),
            "price" => (0..12).map(|i| i as f64 * 7.5 + 10.0).collect::<Vec<f64>>(),
        )
        .unwrap();

        let pattern = Pattern::new(
            vec![
                PatternField::new("city", SemanticType::Nominal),
                PatternField::new("kind", SemanticType::Nominal),
                PatternField::new("price", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, &df);
        // city takes x; kind (2 distinct) colors rather than facets.
        assert_eq!(spec.encoding.x.as_ref().unwrap().field, "city");
        assert_eq!(spec.encoding.color.as_ref().unwrap().field, "kind");
        assert!(!spec.encoding.has_facet());

        let pattern = Pattern::new(
            vec![
                PatternField::new("kind", SemanticType::Nominal),
                PatternField::new("city", SemanticType::Nominal),
                PatternField::new("price", SemanticType::Quantitative),
            ],
            vec![],
        );
        let spec = build(&pattern, &df);
        // city (12 distinct) cannot color, so it splits into column panels.
        assert_eq!(spec.encoding.column.as_ref().unwrap().field, "city");
        assert!(spec.encoding.has_facet());
    }

    #[test]
    fn quantitative_x_facets_by_row() {
        let cities: Vec<String> = (0..20).map(|i| format!("city{}", i % 10)).collect();
        let df = df!(
            "price" => (0..20).map(|i| 10.0 + i as f64 * 3.3).collect::<Vec<f64>>(),
            "area" => (0..20).map(|i| 30.0 + i as f64 * 1.7).collect::<Vec<f64>>(),
            "city" => cities,
        )
        .unwrap();
        let pattern = Pattern::new(
            vec![
                PatternField::new("price", SemanticType::Quantitative),
                PatternField::new("area", SemanticType::Quantitative),
                PatternField::new("city", SemanticType::Nominal),
            ],
            vec![],
        );
        let spec = build(&pattern, &df);
        assert_eq!(spec.mark, Mark::Point);
        assert!(spec.encoding.row.is_some());
        assert!(spec.encoding.column.is_none());
    }

    #[test]
    fn rich_specs_are_not_interactive() {
        let df = df!("price" => (0..20).map(|i| i as f64 * 1.1).collect::<Vec<f64>>()).unwrap();
        let pattern = Pattern::new(
            vec![PatternField::new("price", SemanticType::Quantitative)],
            vec![],
        );
        let spec = build(&pattern, &df);
        assert!(!spec.interactive);
    }
}
