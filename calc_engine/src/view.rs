//! # Localized Views
//!
//! A calculator configuration with every display string resolved for one
//! locale. This is what a presentation layer (or `calc_cli show`) renders;
//! it carries the structural data of the config alongside the text so the
//! consumer never has to touch the locale catalog.
//!
//! Strings fall back to the reference locale, then to the key itself, so a
//! view is always complete even for a partially translated calculator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{
    CalculatorConfig, Category, ChartSpec, FieldType, FieldValue, Reference, ResultDisplay, ResultFormat,
    ShowWhen, UnitType,
};

/// A value and its display label (select options, table columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeled {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputView {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub default_value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<UnitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_units: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Labeled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetView {
    pub id: String,
    pub icon: String,
    pub name: String,
    pub values: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub id: String,
    pub display: ResultDisplay,
    pub format: ResultFormat,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub data_key: String,
    pub columns: Vec<Labeled>,
}

/// Titled text block: info cards and education sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqView {
    pub id: String,
    pub question: String,
    pub answer: String,
}

/// Everything needed to render one calculator in one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorView {
    pub id: String,
    pub version: String,
    pub category: Category,
    pub icon: String,
    /// Locale the strings were resolved for (after fallback)
    pub locale: String,
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputView>,
    pub presets: Vec<PresetView>,
    pub results: Vec<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_table: Option<TableView>,
    pub info_cards: Vec<TextBlock>,
    pub education_sections: Vec<TextBlock>,
    pub faqs: Vec<FaqView>,
    pub references: Vec<Reference>,
}

/// Resolve every display string of `config` for `locale`.
pub fn describe(config: &CalculatorConfig, locale: &str) -> CalculatorView {
    let t = &config.t;
    let text = |key: String| t.text_or_key(locale, &key);

    let inputs = config
        .inputs
        .iter()
        .map(|field| InputView {
            id: field.id.clone(),
            field_type: field.field_type,
            label: text(format!("inputs.{}.label", field.id)),
            help: t.text(locale, &format!("inputs.{}.help", field.id)).map(str::to_string),
            default_value: field.default_value.clone(),
            min: field.min,
            max: field.max,
            step: field.step,
            unit_type: field.unit_type,
            default_unit: field.default_unit.clone(),
            allowed_units: field.allowed_units.clone(),
            options: field
                .options
                .iter()
                .map(|option| Labeled {
                    id: option.clone(),
                    label: text(format!("inputs.{}.options.{}", field.id, option)),
                })
                .collect(),
            show_when: field.show_when.clone(),
            required: field.required,
        })
        .collect();

    let presets = config
        .presets
        .iter()
        .map(|preset| PresetView {
            id: preset.id.clone(),
            icon: preset.icon.clone(),
            name: text(format!("presets.{}.name", preset.id)),
            values: preset.values.clone(),
        })
        .collect();

    let results = config
        .results
        .iter()
        .map(|result| ResultView {
            id: result.id.clone(),
            display: result.display,
            format: result.format,
            label: text(format!("results.{}.label", result.id)),
        })
        .collect();

    let detailed_table = config.detailed_table.as_ref().map(|table| TableView {
        data_key: table.data_key.clone(),
        columns: table
            .columns
            .iter()
            .map(|column| Labeled {
                id: column.clone(),
                label: text(format!("table.columns.{}", column)),
            })
            .collect(),
    });

    CalculatorView {
        id: config.id.clone(),
        version: config.version.clone(),
        category: config.category,
        icon: config.icon.clone(),
        locale: t.resolve_locale(locale).to_string(),
        name: text("name".to_string()),
        description: text("description".to_string()),
        inputs,
        presets,
        results,
        chart: config.chart.clone(),
        detailed_table,
        info_cards: config
            .info_cards
            .iter()
            .map(|card| TextBlock {
                id: card.id.clone(),
                icon: Some(card.icon.clone()),
                title: text(format!("infoCards.{}.title", card.id)),
                body: text(format!("infoCards.{}.body", card.id)),
            })
            .collect(),
        education_sections: config
            .education_sections
            .iter()
            .map(|section| TextBlock {
                id: section.id.clone(),
                icon: None,
                title: text(format!("education.{}.title", section.id)),
                body: text(format!("education.{}.body", section.id)),
            })
            .collect(),
        faqs: config
            .faqs
            .iter()
            .map(|faq| FaqView {
                id: faq.id.clone(),
                question: text(format!("faqs.{}.question", faq.id)),
                answer: text(format!("faqs.{}.answer", faq.id)),
            })
            .collect(),
        references: config.references.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::{loan, raid};

    #[test]
    fn test_describe_resolves_labels() {
        let config = loan::config().unwrap();
        let view = describe(&config, "de");
        assert_eq!(view.locale, "de");
        assert_eq!(view.name, "Kreditrechner");
        let frequency = view.inputs.iter().find(|i| i.id == "paymentFrequency").unwrap();
        assert_eq!(frequency.options[0].label, "Monatlich");
        assert_eq!(view.presets.len(), config.presets.len());
        assert!(view.detailed_table.unwrap().columns.iter().any(|c| c.label == "Restschuld"));
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let config = raid::config().unwrap();
        let view = describe(&config, "ja");
        assert_eq!(view.locale, "en");
        assert!(!view.name.is_empty());
        assert!(view.results.iter().all(|r| !r.label.starts_with("results.")));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let json = serde_json::to_value(describe(&loan::config().unwrap(), "en")).unwrap();
        assert!(json["inputs"][0]["defaultValue"].is_number());
        assert!(json.get("infoCards").is_some());
    }
}
