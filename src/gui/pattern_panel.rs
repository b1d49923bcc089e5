//! Pattern Panel
//! Left side panel: data source, pattern fields, filters, progress.
//! Pattern detection itself lives upstream; this panel lets the user build
//! and pin one by hand.

use crate::data::loader;
use crate::pattern::{Pattern, PatternField, PatternFilter, SemanticType};
use crate::stats;
use egui::{Color32, ComboBox, DragValue, RichText, ScrollArea};
use polars::prelude::DataFrame;
use std::path::PathBuf;

/// Actions triggered by the pattern panel
#[derive(Debug, Clone, PartialEq)]
pub enum PatternPanelAction {
    None,
    BrowseCsv,
    PinPattern,
    ClearPattern,
}

const FIELD_SLOTS: usize = 3;
const NONE_LABEL: &str = "(none)";
/// Checkbox lists stop after this many values; the overflow is labeled.
const FILTER_CHOICE_CAP: usize = 100;

pub struct PatternPanel {
    pub columns: Vec<(String, SemanticType)>,
    pub csv_path: Option<PathBuf>,
    field_slots: [String; FIELD_SLOTS],
    filter_field: String,
    filter_choices: Vec<String>,
    filter_choices_hidden: usize,
    filter_selected: Vec<bool>,
    filter_min: f64,
    filter_max: f64,
    staged_filters: Vec<PatternFilter>,
    pub progress: f32,
    pub status: String,
}

impl Default for PatternPanel {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            csv_path: None,
            field_slots: Default::default(),
            filter_field: String::new(),
            filter_choices: Vec::new(),
            filter_choices_hidden: 0,
            filter_selected: Vec::new(),
            filter_min: 0.0,
            filter_max: 0.0,
            staged_filters: Vec::new(),
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl PatternPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update available columns after CSV load
    pub fn update_columns(&mut self, columns: Vec<(String, SemanticType)>) {
        self.columns = columns;
        self.field_slots = Default::default();
        self.filter_field.clear();
        self.filter_choices.clear();
        self.filter_choices_hidden = 0;
        self.filter_selected.clear();
        self.staged_filters.clear();
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    fn semantic_of(&self, name: &str) -> Option<SemanticType> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, semantic)| *semantic)
    }

    fn filter_field_is_numeric(&self) -> bool {
        self.semantic_of(&self.filter_field) == Some(SemanticType::Quantitative)
    }

    fn refresh_filter_choices(&mut self, dataset: Option<&DataFrame>) {
        self.filter_choices.clear();
        self.filter_choices_hidden = 0;
        self.filter_selected.clear();
        let Some(df) = dataset else {
            return;
        };
        if self.filter_field_is_numeric() {
            if let Some(numeric) = stats::profile_field(df, &self.filter_field)
                .and_then(|p| p.numeric)
            {
                self.filter_min = numeric.min;
                self.filter_max = numeric.max;
            }
        } else {
            let mut values = loader::unique_values(df, &self.filter_field);
            if values.len() > FILTER_CHOICE_CAP {
                self.filter_choices_hidden = values.len() - FILTER_CHOICE_CAP;
                values.truncate(FILTER_CHOICE_CAP);
            }
            self.filter_selected = vec![false; values.len()];
            self.filter_choices = values;
        }
    }

    /// The pattern the current panel state describes, if any field is set.
    pub fn build_pattern(&self) -> Option<Pattern> {
        let mut fields: Vec<PatternField> = Vec::new();
        for slot in &self.field_slots {
            if slot.is_empty() || fields.iter().any(|f| &f.name == slot) {
                continue;
            }
            if let Some(semantic) = self.semantic_of(slot) {
                fields.push(PatternField::new(slot.clone(), semantic));
            }
        }
        if fields.is_empty() {
            return None;
        }
        Some(Pattern::new(fields, self.staged_filters.clone()))
    }

    /// Draw the panel
    pub fn show(&mut self, ui: &mut egui::Ui, dataset: Option<&DataFrame>) -> PatternPanelAction {
        let mut action = PatternPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🔍 PatternLens")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("CSV pattern explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            ui.visuals().text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = PatternPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Pattern Fields =====
        ui.label(RichText::new("🧩 Pattern Fields").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 70.0;
        let combo_width = 170.0;

        for i in 0..FIELD_SLOTS {
            ui.horizontal(|ui| {
                ui.add_sized(
                    [label_width, 20.0],
                    egui::Label::new(format!("Field {}:", i + 1)),
                );
                let selected_text = if self.field_slots[i].is_empty() {
                    NONE_LABEL.to_string()
                } else {
                    self.field_slots[i].clone()
                };
                ComboBox::from_id_salt(("pattern_field", i))
                    .width(combo_width)
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        if ui
                            .selectable_label(self.field_slots[i].is_empty(), NONE_LABEL)
                            .clicked()
                        {
                            self.field_slots[i].clear();
                        }
                        for (col, semantic) in &self.columns {
                            let label = format!("{} ({})", col, semantic_badge(*semantic));
                            if ui
                                .selectable_label(self.field_slots[i] == *col, label)
                                .clicked()
                            {
                                self.field_slots[i] = col.clone();
                            }
                        }
                    });
            });
            ui.add_space(5.0);
        }

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let mut filter_field_changed = false;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Field:"));
            ComboBox::from_id_salt("filter_field")
                .width(combo_width)
                .selected_text(&self.filter_field)
                .show_ui(ui, |ui| {
                    for (col, _) in &self.columns {
                        if ui
                            .selectable_label(self.filter_field == *col, col)
                            .clicked()
                        {
                            self.filter_field = col.clone();
                            filter_field_changed = true;
                        }
                    }
                });
        });
        if filter_field_changed {
            self.refresh_filter_choices(dataset);
        }

        if !self.filter_field.is_empty() {
            ui.add_space(5.0);
            if self.filter_field_is_numeric() {
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("Range:"));
                    ui.add(DragValue::new(&mut self.filter_min).speed(0.1));
                    ui.label("to");
                    ui.add(DragValue::new(&mut self.filter_max).speed(0.1));
                });
                if ui.small_button("Add filter").clicked() && self.filter_min <= self.filter_max {
                    self.staged_filters.push(PatternFilter::range(
                        self.filter_field.clone(),
                        self.filter_min,
                        self.filter_max,
                    ));
                }
            } else {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(5.0)
                    .inner_margin(5.0)
                    .show(ui, |ui| {
                        ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                            for (i, value) in self.filter_choices.iter().enumerate() {
                                if i < self.filter_selected.len() {
                                    ui.checkbox(&mut self.filter_selected[i], value);
                                }
                            }
                            if self.filter_choices_hidden > 0 {
                                ui.label(
                                    RichText::new(format!(
                                        "+{} more values not listed",
                                        self.filter_choices_hidden
                                    ))
                                    .weak(),
                                );
                            }
                        });
                    });
                let picked: Vec<String> = self
                    .filter_choices
                    .iter()
                    .zip(self.filter_selected.iter())
                    .filter(|(_, &on)| on)
                    .map(|(v, _)| v.clone())
                    .collect();
                if ui.small_button("Add filter").clicked() && !picked.is_empty() {
                    self.staged_filters
                        .push(PatternFilter::one_of(self.filter_field.clone(), picked));
                }
            }
        }

        if !self.staged_filters.is_empty() {
            ui.add_space(8.0);
            let mut remove: Option<usize> = None;
            for (i, filter) in self.staged_filters.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(describe_filter(filter)).size(11.0));
                    if ui.small_button("✕").clicked() {
                        remove = Some(i);
                    }
                });
            }
            if let Some(i) = remove {
                self.staged_filters.remove(i);
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Actions =====
        ui.vertical_centered(|ui| {
            let can_pin = dataset.is_some() && self.field_slots.iter().any(|s| !s.is_empty());
            ui.add_enabled_ui(can_pin, |ui| {
                let button = egui::Button::new(RichText::new("📌 Pin Pattern").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = PatternPanelAction::PinPattern;
                }
            });

            ui.add_space(8.0);
            if ui.small_button("Clear pattern").clicked() {
                action = PatternPanelAction::ClearPattern;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

fn semantic_badge(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::Nominal => "nominal",
        SemanticType::Ordinal => "ordinal",
        SemanticType::Quantitative => "number",
        SemanticType::Temporal => "time",
    }
}

fn describe_filter(filter: &PatternFilter) -> String {
    use crate::pattern::FilterRule;
    match &filter.rule {
        FilterRule::OneOf { values } => format!("{} ∈ {{{}}}", filter.field, values.join(", ")),
        FilterRule::Range { min, max } => format!("{} ∈ [{min}, {max}]", filter.field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::FilterRule;
    use polars::df;

    fn panel_with_columns() -> PatternPanel {
        let mut panel = PatternPanel::new();
        panel.update_columns(vec![
            ("city".to_string(), SemanticType::Nominal),
            ("price".to_string(), SemanticType::Quantitative),
        ]);
        panel
    }

    #[test]
    fn empty_slots_build_no_pattern() {
        let panel = panel_with_columns();
        assert!(panel.build_pattern().is_none());
    }

    #[test]
    fn duplicate_and_unknown_slots_are_dropped() {
        let mut panel = panel_with_columns();
        panel.field_slots = ["city".into(), "city".into(), "gone".into()];
        let pattern = panel.build_pattern().unwrap();
        assert_eq!(pattern.fields.len(), 1);
        assert_eq!(pattern.fields[0].name, "city");
        assert_eq!(pattern.fields[0].semantic, SemanticType::Nominal);
    }

    #[test]
    fn staged_filters_flow_into_the_pattern() {
        let mut panel = panel_with_columns();
        panel.field_slots[0] = "price".into();
        panel
            .staged_filters
            .push(PatternFilter::range("price", 10.0, 20.0));
        let pattern = panel.build_pattern().unwrap();
        assert_eq!(pattern.filters.len(), 1);
        assert!(matches!(
            pattern.filters[0].rule,
            FilterRule::Range { .. }
        ));
    }

    #[test]
    fn numeric_filter_choices_seed_range_from_data() {
        let mut panel = panel_with_columns();
        panel.filter_field = "price".into();
        let df = df!("price" => [5.0, 9.0, 2.0]).unwrap();
        panel.refresh_filter_choices(Some(&df));
        assert_eq!(panel.filter_min, 2.0);
        assert_eq!(panel.filter_max, 9.0);
    }

    #[test]
    fn categorical_filter_choices_are_capped_with_note() {
        let mut panel = panel_with_columns();
        panel.filter_field = "city".into();
        let values: Vec<String> = (0..150).map(|i| format!("c{i:03}")).collect();
        let df = df!("city" => values).unwrap();
        panel.refresh_filter_choices(Some(&df));
        assert_eq!(panel.filter_choices.len(), FILTER_CHOICE_CAP);
        assert_eq!(panel.filter_choices_hidden, 50);
        assert_eq!(panel.filter_selected.len(), FILTER_CHOICE_CAP);
    }
}
