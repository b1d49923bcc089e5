//! Pattern model.
//!
//! A pattern is a detected (or, here, user-pinned) relationship in the data:
//! the fields it spans and the filter predicates that carve out the relevant
//! row subset.

use serde::Serialize;

/// Semantic role of a field, independent of its physical dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

impl SemanticType {
    /// Whether the field carries measurable values rather than categories.
    pub fn is_measure(self) -> bool {
        matches!(self, SemanticType::Quantitative)
    }
}

/// A column participating in a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternField {
    pub name: String,
    pub semantic: SemanticType,
}

impl PatternField {
    pub fn new(name: impl Into<String>, semantic: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic,
        }
    }
}

/// Predicate applied to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterRule {
    /// Keep rows whose value equals any of the listed values.
    /// An empty list matches nothing.
    OneOf { values: Vec<String> },
    /// Keep rows with `min <= value <= max`.
    Range { min: f64, max: f64 },
}

/// One filter of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFilter {
    pub field: String,
    pub rule: FilterRule,
}

impl PatternFilter {
    pub fn one_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            rule: FilterRule::OneOf { values },
        }
    }

    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            field: field.into(),
            rule: FilterRule::Range { min, max },
        }
    }
}

/// A pinned pattern: fields plus the filters deriving its row subset.
///
/// Compared by value; the canvas memoizes derived rows and specs on
/// (dataset identity, pattern equality).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    pub fields: Vec<PatternField>,
    pub filters: Vec<PatternFilter>,
}

impl Pattern {
    pub fn new(fields: Vec<PatternField>, filters: Vec<PatternFilter>) -> Self {
        Self { fields, filters }
    }
}
