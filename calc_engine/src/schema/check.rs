//! Static consistency checks for calculator configurations.
//!
//! Run at registry construction and by `calc_cli check`. Each finding is a
//! [`ConfigIssue`]; an empty list means the configuration honours the schema
//! contract (bounds, options, references between fields, locale coverage).

use std::collections::BTreeSet;

use semver::Version;
use serde::{Deserialize, Serialize};

use super::{CalculatorConfig, FieldValue, InputField};
use crate::template::placeholders;

/// Whether an issue breaks the schema contract or only leaves a
/// translation incomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    #[default]
    Structure,
    TranslationGap,
}

/// One problem found in a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Where the problem is (e.g. "inputs.prefix", "presets.office", "t.de")
    pub location: String,
    pub message: String,
    #[serde(default)]
    pub kind: IssueKind,
}

impl ConfigIssue {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigIssue {
            location: location.into(),
            message: message.into(),
            kind: IssueKind::Structure,
        }
    }

    fn translation_gap(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigIssue {
            kind: IssueKind::TranslationGap,
            ..ConfigIssue::new(location, message)
        }
    }

    pub fn is_translation_gap(&self) -> bool {
        self.kind == IssueKind::TranslationGap
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Why `value` cannot be assigned to `field`, or `None` when it can.
///
/// Numeric fields accept numbers and numeric text; select/radio values must
/// be one of the declared options; toggles need a boolean.
pub fn value_violation(field: &InputField, value: &FieldValue) -> Option<String> {
    if field.field_type.is_numeric() {
        let Some(number) = value.as_f64() else {
            return Some(format!("expected a number, got '{}'", value));
        };
        if !number.is_finite() {
            return Some("number must be finite".to_string());
        }
        if let Some(min) = field.min {
            if number < min {
                return Some(format!("{} is below the minimum {}", number, min));
            }
        }
        if let Some(max) = field.max {
            if number > max {
                return Some(format!("{} is above the maximum {}", number, max));
            }
        }
        return None;
    }
    if field.field_type.has_options() {
        let text = value.to_string();
        if !field.options.iter().any(|o| *o == text) {
            return Some(format!("'{}' is not one of [{}]", text, field.options.join(", ")));
        }
        return None;
    }
    if field.field_type == super::FieldType::Toggle && value.as_bool().is_none() {
        return Some(format!("expected true or false, got '{}'", value));
    }
    None
}

/// Check a configuration against the schema contract.
pub fn check_config(config: &CalculatorConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if let Err(e) = Version::parse(&config.version) {
        issues.push(ConfigIssue::new(
            "version",
            format!("'{}' is not a semantic version: {}", config.version, e),
        ));
    }

    check_inputs(config, &mut issues);
    check_presets(config, &mut issues);
    check_results(config, &mut issues);
    check_locales(config, &mut issues);

    issues
}

fn check_inputs(config: &CalculatorConfig, issues: &mut Vec<ConfigIssue>) {
    let mut seen = BTreeSet::new();
    for field in &config.inputs {
        let location = format!("inputs.{}", field.id);
        if !seen.insert(field.id.as_str()) {
            issues.push(ConfigIssue::new(&location, "duplicate input id"));
        }
        if let (Some(min), Some(max)) = (field.min, field.max) {
            if min > max {
                issues.push(ConfigIssue::new(&location, format!("min {} exceeds max {}", min, max)));
            }
        }
        if field.field_type.has_options() && field.options.is_empty() {
            issues.push(ConfigIssue::new(&location, "select/radio field has no options"));
        }
        if let Some(reason) = value_violation(field, &field.default_value) {
            issues.push(ConfigIssue::new(&location, format!("default value invalid: {}", reason)));
        }
        if let Some(unit) = &field.default_unit {
            if !field.accepts_unit(unit) {
                issues.push(ConfigIssue::new(
                    &location,
                    format!("default unit '{}' not in allowed units", unit),
                ));
            }
        }
        if field.unit_type.is_some() && field.default_unit.is_none() {
            issues.push(ConfigIssue::new(&location, "unit-typed field has no default unit"));
        }
        if let Some(condition) = &field.show_when {
            if condition.field == field.id {
                issues.push(ConfigIssue::new(&location, "showWhen references the field itself"));
            } else if config.field(&condition.field).is_none() {
                issues.push(ConfigIssue::new(
                    &location,
                    format!("showWhen references unknown field '{}'", condition.field),
                ));
            }
        }
    }
}

fn check_presets(config: &CalculatorConfig, issues: &mut Vec<ConfigIssue>) {
    let mut seen = BTreeSet::new();
    for preset in &config.presets {
        let location = format!("presets.{}", preset.id);
        if !seen.insert(preset.id.as_str()) {
            issues.push(ConfigIssue::new(&location, "duplicate preset id"));
        }
        for (key, value) in &preset.values {
            match config.field(key) {
                None => issues.push(ConfigIssue::new(&location, format!("unknown input '{}'", key))),
                Some(field) => {
                    if let Some(reason) = value_violation(field, value) {
                        issues.push(ConfigIssue::new(&location, format!("{}: {}", key, reason)));
                    }
                }
            }
        }
    }
}

fn check_results(config: &CalculatorConfig, issues: &mut Vec<ConfigIssue>) {
    if config.results.is_empty() {
        issues.push(ConfigIssue::new("results", "no results declared"));
    }
    let mut seen = BTreeSet::new();
    for result in &config.results {
        if !seen.insert(result.id.as_str()) {
            issues.push(ConfigIssue::new(format!("results.{}", result.id), "duplicate result id"));
        }
    }
    if let Some(chart) = &config.chart {
        if chart.data_key.is_empty() || chart.x_key.is_empty() || chart.series.is_empty() {
            issues.push(ConfigIssue::new("chart", "chart needs a data key, x key and series"));
        }
    }
    if let Some(table) = &config.detailed_table {
        if table.data_key.is_empty() || table.columns.is_empty() {
            issues.push(ConfigIssue::new("detailedTable", "table needs a data key and columns"));
        }
    }
}

/// Keys the reference bundle must carry for the declared structure
fn required_keys(config: &CalculatorConfig) -> Vec<String> {
    let mut keys = vec!["name".to_string(), "description".to_string()];
    for field in &config.inputs {
        keys.push(format!("inputs.{}.label", field.id));
        for option in &field.options {
            keys.push(format!("inputs.{}.options.{}", field.id, option));
        }
    }
    for result in &config.results {
        keys.push(format!("results.{}.label", result.id));
    }
    for preset in &config.presets {
        keys.push(format!("presets.{}.name", preset.id));
    }
    for card in &config.info_cards {
        keys.push(format!("infoCards.{}.title", card.id));
        keys.push(format!("infoCards.{}.body", card.id));
    }
    for section in &config.education_sections {
        keys.push(format!("education.{}.title", section.id));
        keys.push(format!("education.{}.body", section.id));
    }
    for faq in &config.faqs {
        keys.push(format!("faqs.{}.question", faq.id));
        keys.push(format!("faqs.{}.answer", faq.id));
    }
    if let Some(table) = &config.detailed_table {
        for column in &table.columns {
            keys.push(format!("table.columns.{}", column));
        }
    }
    keys
}

fn check_locales(config: &CalculatorConfig, issues: &mut Vec<ConfigIssue>) {
    let reference = config.t.reference().to_string();
    let Some(bundle) = config.t.bundle(&reference) else {
        issues.push(ConfigIssue::new(
            format!("t.{}", reference),
            "reference locale bundle is missing",
        ));
        return;
    };
    for key in required_keys(config) {
        if bundle.get(&key).is_none() {
            issues.push(ConfigIssue::new(format!("t.{}", reference), format!("missing key '{}'", key)));
        }
    }
    // summary templates may only interpolate inputs and declared results
    for (key, template) in bundle.section("formats") {
        for name in placeholders(&template) {
            let known = config.field(&name).is_some() || config.results.iter().any(|r| r.id == name);
            if !known {
                issues.push(ConfigIssue::new(
                    format!("t.{}.formats.{}", reference, key),
                    format!("placeholder '{{{}}}' is neither an input nor a result", name),
                ));
            }
        }
    }
    for (locale, missing) in config.t.parity_report() {
        issues.push(ConfigIssue::translation_gap(
            format!("t.{}", locale),
            format!("{} key(s) missing versus '{}': {}", missing.len(), reference, missing.join(", ")),
        ));
    }
}
