//! # Calculator Configuration Schema
//!
//! The declarative description every calculator module provides: identity,
//! input fields, presets, result declarations, display blocks and the
//! per-locale string catalog.
//!
//! Configurations are plain data. They are built once when the registry is
//! constructed and never mutated afterwards; the engine and the presentation
//! layer only read them.
//!
//! ## Structure
//!
//! ```text
//! CalculatorConfig
//! ├── id, version, category, icon
//! ├── inputs: Vec<InputField>      (ordered form fields)
//! ├── presets: Vec<Preset>         (named input bundles)
//! ├── results: Vec<ResultField>    (declared outputs)
//! ├── chart / detailed_table       (metadata-driven displays)
//! ├── info_cards, education_sections, faqs, references
//! └── t: LocaleCatalog             (locale -> string bundle)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::schema::{CalculatorConfig, Category, InputField, ResultField};
//!
//! let config = CalculatorConfig::new("tip", "1.0.0", Category::Finance, "receipt")
//!     .with_input(InputField::number("bill", 50.0).range(0.0, 10_000.0))
//!     .with_input(InputField::select("service", "good", &["poor", "good", "great"]))
//!     .with_result(ResultField::primary("tip"));
//!
//! assert_eq!(config.inputs.len(), 2);
//! assert!(config.field("service").is_some());
//! ```

pub mod check;
pub mod visibility;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::RawValueMap;
use crate::locale::LocaleCatalog;

pub use check::{check_config, ConfigIssue, IssueKind};
pub use visibility::is_visible;

// ============================================================================
// Field Values
// ============================================================================

/// A concrete value for an input field: defaults, preset entries and
/// `showWhen` operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a raw JSON value. Arrays, objects and null have no field value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Loose equality used by `showWhen`: numbers compare by value, and a
    /// number matches text holding the same number ("24" == 24).
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Number(n), FieldValue::Text(s)) | (FieldValue::Text(s), FieldValue::Number(n)) => {
                s.trim().parse::<f64>().map(|parsed| parsed == *n).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

// ============================================================================
// Input Fields
// ============================================================================

/// Form control type of an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Select,
    Radio,
    Toggle,
    Text,
    Stepper,
}

impl FieldType {
    /// Whether values of this type are numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Stepper)
    }

    /// Whether values must come from the field's option list
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

/// Kind of quantity a unit-typed field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitType {
    Currency,
    DataSize,
    DataRate,
}

/// Operand of a `showWhen` condition: one value, or a list matched with OR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShowWhenValue {
    AnyOf(Vec<FieldValue>),
    One(FieldValue),
}

/// Conditional visibility: show the field when `field` equals `value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowWhen {
    pub field: String,
    pub value: ShowWhenValue,
}

/// One form field of a calculator.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "avgPageSize",
///   "type": "number",
///   "defaultValue": 2.5,
///   "min": 0.0,
///   "unitType": "dataSize",
///   "defaultUnit": "MB",
///   "allowedUnits": ["KB", "MB"],
///   "showWhen": { "field": "mode", "value": "website" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    /// Unique within the calculator
    pub id: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub default_value: FieldValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<UnitType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_units: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ShowWhen>,

    /// Option values for select/radio fields. Labels live in the locale
    /// bundle under `inputs.<id>.options.<value>`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Reject submissions that blank this field out (null or empty text)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl InputField {
    fn base(id: &str, field_type: FieldType, default_value: FieldValue) -> Self {
        InputField {
            id: id.to_string(),
            field_type,
            default_value,
            min: None,
            max: None,
            step: None,
            unit_type: None,
            default_unit: None,
            allowed_units: Vec::new(),
            show_when: None,
            options: Vec::new(),
            required: false,
        }
    }

    /// Free numeric entry
    pub fn number(id: &str, default: f64) -> Self {
        Self::base(id, FieldType::Number, FieldValue::Number(default))
    }

    /// Numeric entry with +/- buttons
    pub fn stepper(id: &str, default: f64) -> Self {
        Self::base(id, FieldType::Stepper, FieldValue::Number(default))
    }

    /// Dropdown over fixed option values
    pub fn select(id: &str, default: &str, options: &[&str]) -> Self {
        let mut field = Self::base(id, FieldType::Select, FieldValue::from(default));
        field.options = options.iter().map(|o| o.to_string()).collect();
        field
    }

    /// Radio group over fixed option values
    pub fn radio(id: &str, default: &str, options: &[&str]) -> Self {
        let mut field = Self::select(id, default, options);
        field.field_type = FieldType::Radio;
        field
    }

    pub fn toggle(id: &str, default: bool) -> Self {
        Self::base(id, FieldType::Toggle, FieldValue::Bool(default))
    }

    pub fn text(id: &str, default: &str) -> Self {
        Self::base(id, FieldType::Text, FieldValue::from(default))
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Declare the field as a unit-typed quantity
    pub fn with_unit(mut self, unit_type: UnitType, default_unit: &str, allowed: &[&str]) -> Self {
        self.unit_type = Some(unit_type);
        self.default_unit = Some(default_unit.to_string());
        self.allowed_units = allowed.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Show only when `field` equals `value`
    pub fn show_when(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.show_when = Some(ShowWhen {
            field: field.to_string(),
            value: ShowWhenValue::One(value.into()),
        });
        self
    }

    /// Show when `field` equals any of `values`
    pub fn show_when_any(mut self, field: &str, values: &[&str]) -> Self {
        self.show_when = Some(ShowWhen {
            field: field.to_string(),
            value: ShowWhenValue::AnyOf(values.iter().map(|v| FieldValue::from(*v)).collect()),
        });
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether `unit` may be chosen for this field
    pub fn accepts_unit(&self, unit: &str) -> bool {
        self.allowed_units.is_empty() || self.allowed_units.iter().any(|u| u == unit)
    }
}

// ============================================================================
// Presets & Results
// ============================================================================

/// A named bundle of input values used to pre-populate the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub icon: String,
    pub values: BTreeMap<String, FieldValue>,
}

impl Preset {
    pub fn new(id: &str, icon: &str) -> Self {
        Preset {
            id: id.to_string(),
            icon: icon.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }
}

/// Prominence of a result in the results panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDisplay {
    Primary,
    Secondary,
}

/// How the presentation layer should treat the formatted string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Text,
    Percent,
    Currency,
    Number,
}

/// A declared output of the compute function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultField {
    pub id: String,
    pub display: ResultDisplay,
    pub format: ResultFormat,
}

impl ResultField {
    pub fn primary(id: &str) -> Self {
        ResultField {
            id: id.to_string(),
            display: ResultDisplay::Primary,
            format: ResultFormat::Text,
        }
    }

    pub fn secondary(id: &str) -> Self {
        ResultField {
            display: ResultDisplay::Secondary,
            ..Self::primary(id)
        }
    }

    pub fn format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }
}

// ============================================================================
// Display Blocks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Area,
    Bar,
    Pie,
}

/// Chart fed from a metadata row array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub chart_type: ChartType,
    /// Key of the row array in `CalculatorResults::metadata`
    pub data_key: String,
    /// Row field used for the x axis
    pub x_key: String,
    /// Row fields plotted as series
    pub series: Vec<String>,
}

/// Drill-down table fed from a metadata row array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub data_key: String,
    pub columns: Vec<String>,
}

/// Titles and bodies resolve from `infoCards.<id>.title` / `.body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoCard {
    pub id: String,
    pub icon: String,
}

/// Resolves from `education.<id>.title` / `.body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationSection {
    pub id: String,
}

/// Resolves from `faqs.<id>.question` / `.answer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
}

/// External source cited by the calculator (not localized)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Catalog grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Finance,
    Health,
    Math,
    Networking,
    Storage,
    Conversion,
    Everyday,
}

impl Category {
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Health => "Health",
            Category::Math => "Math",
            Category::Networking => "Networking",
            Category::Storage => "Storage",
            Category::Conversion => "Conversion",
            Category::Everyday => "Everyday",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Calculator Configuration
// ============================================================================

/// Complete declarative description of one calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    pub id: String,
    /// Semantic version of the configuration
    pub version: String,
    pub category: Category,
    pub icon: String,
    pub inputs: Vec<InputField>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    pub results: Vec<ResultField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_table: Option<TableSpec>,
    #[serde(default)]
    pub info_cards: Vec<InfoCard>,
    #[serde(default)]
    pub education_sections: Vec<EducationSection>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub t: LocaleCatalog,
}

impl CalculatorConfig {
    pub fn new(id: &str, version: &str, category: Category, icon: &str) -> Self {
        CalculatorConfig {
            id: id.to_string(),
            version: version.to_string(),
            category,
            icon: icon.to_string(),
            inputs: Vec::new(),
            presets: Vec::new(),
            results: Vec::new(),
            chart: None,
            detailed_table: None,
            info_cards: Vec::new(),
            education_sections: Vec::new(),
            faqs: Vec::new(),
            references: Vec::new(),
            t: LocaleCatalog::default(),
        }
    }

    pub fn with_input(mut self, field: InputField) -> Self {
        self.inputs.push(field);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.push(preset);
        self
    }

    pub fn with_result(mut self, result: ResultField) -> Self {
        self.results.push(result);
        self
    }

    pub fn with_chart(mut self, chart_type: ChartType, data_key: &str, x_key: &str, series: &[&str]) -> Self {
        self.chart = Some(ChartSpec {
            chart_type,
            data_key: data_key.to_string(),
            x_key: x_key.to_string(),
            series: series.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_table(mut self, data_key: &str, columns: &[&str]) -> Self {
        self.detailed_table = Some(TableSpec {
            data_key: data_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_info_card(mut self, id: &str, icon: &str) -> Self {
        self.info_cards.push(InfoCard {
            id: id.to_string(),
            icon: icon.to_string(),
        });
        self
    }

    pub fn with_education(mut self, id: &str) -> Self {
        self.education_sections.push(EducationSection { id: id.to_string() });
        self
    }

    pub fn with_faq(mut self, id: &str) -> Self {
        self.faqs.push(Faq { id: id.to_string() });
        self
    }

    pub fn with_reference(mut self, title: &str, url: &str) -> Self {
        self.references.push(Reference {
            title: title.to_string(),
            url: url.to_string(),
        });
        self
    }

    pub fn with_locales(mut self, catalog: LocaleCatalog) -> Self {
        self.t = catalog;
        self
    }

    /// Look up an input field by id
    pub fn field(&self, id: &str) -> Option<&InputField> {
        self.inputs.iter().find(|f| f.id == id)
    }

    /// Look up a preset by id
    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Every input's default value as raw JSON
    pub fn default_values(&self) -> RawValueMap {
        self.inputs
            .iter()
            .map(|f| (f.id.clone(), f.default_value.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[true, 2.5, "monthly"]"#).unwrap();
        assert_eq!(values[0], FieldValue::Bool(true));
        assert_eq!(values[1], FieldValue::Number(2.5));
        assert_eq!(values[2], FieldValue::Text("monthly".into()));
    }

    #[test]
    fn test_loose_equality() {
        assert!(FieldValue::from("24").loosely_equals(&FieldValue::Number(24.0)));
        assert!(!FieldValue::from("abc").loosely_equals(&FieldValue::Number(1.0)));
        assert!(!FieldValue::Bool(true).loosely_equals(&FieldValue::from("true")));
    }

    #[test]
    fn test_input_field_serialization() {
        let field = InputField::number("avgPageSize", 2.5)
            .min(0.0)
            .with_unit(UnitType::DataSize, "MB", &["KB", "MB"])
            .show_when("mode", "website");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["defaultValue"], 2.5);
        assert_eq!(json["unitType"], "dataSize");
        assert_eq!(json["showWhen"]["value"], "website");
        assert!(json.get("required").is_none());

        let roundtrip: InputField = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, field);
    }

    #[test]
    fn test_show_when_list_deserializes() {
        let field = InputField::number("drivesPerGroup", 3.0).show_when_any("raidLevel", &["50", "60"]);
        let json = serde_json::to_string(&field).unwrap();
        let roundtrip: InputField = serde_json::from_str(&json).unwrap();
        match roundtrip.show_when.unwrap().value {
            ShowWhenValue::AnyOf(values) => assert_eq!(values.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_acceptance() {
        let field = InputField::number("cost", 1.0).with_unit(UnitType::Currency, "USD", &["USD", "EUR"]);
        assert!(field.accepts_unit("EUR"));
        assert!(!field.accepts_unit("GBP"));
        assert!(InputField::number("n", 1.0).accepts_unit("anything"));
    }

    #[test]
    fn test_default_values() {
        let config = CalculatorConfig::new("x", "1.0.0", Category::Math, "calc")
            .with_input(InputField::number("a", 1.0))
            .with_input(InputField::toggle("b", true));
        let defaults = config.default_values();
        assert_eq!(defaults["a"], serde_json::json!(1.0));
        assert_eq!(defaults["b"], serde_json::json!(true));
    }
}
