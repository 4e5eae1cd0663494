//! # Evaluation Engine
//!
//! Front door of the library. The engine owns the registry and the settings,
//! checks every configuration once at construction and then evaluates
//! requests:
//!
//! 1. resolve the calculator id
//! 2. merge values: input defaults, then the preset (if named), then the
//!    submitted values
//! 3. type-check submitted values and unit overrides against the schema
//! 4. pick the locale strings and run the compute function
//!
//! Schema violations are returned as [`CalcError`]. Domain problems (an
//! impossible subnet plan, too few drives) come back as `Ok` results with
//! `is_valid == false`.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::{Engine, EngineSettings, EvaluationRequest};
//!
//! let engine = Engine::new(EngineSettings::default()).unwrap();
//! let request = EvaluationRequest::new("bandwidth")
//!     .with_value("value", 100)
//!     .with_value("fromUnit", "mbps")
//!     .with_value("toUnit", "MBps");
//! let results = engine.evaluate(&request).unwrap();
//! assert!(results.is_valid);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::calculators::CalculatorDefinition;
use crate::errors::{CalcError, CalcResult};
use crate::input::{ComputeInput, RawValueMap, UnitMap};
use crate::registry::Registry;
use crate::results::CalculatorResults;
use crate::schema::check::value_violation;
use crate::schema::visibility::visible_fields;
use crate::schema::{check_config, is_visible, CalculatorConfig, ConfigIssue, FieldValue, InputField, UnitType};
use crate::settings::{EngineSettings, MissingTranslationPolicy};
use crate::units::{is_known_currency, DataRateUnit, DataSizeUnit};

/// One evaluation request.
///
/// ## JSON Example
///
/// ```json
/// {
///   "calculatorId": "loan",
///   "preset": "mortgage",
///   "values": { "extraPayment": 200 },
///   "fieldUnits": { "loanAmount": "EUR" },
///   "locale": "de"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub calculator_id: String,
    #[serde(default)]
    pub values: RawValueMap,
    #[serde(default)]
    pub field_units: UnitMap,
    /// Falls back to the engine's default locale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl EvaluationRequest {
    pub fn new(calculator_id: &str) -> Self {
        EvaluationRequest {
            calculator_id: calculator_id.to_string(),
            ..EvaluationRequest::default()
        }
    }

    pub fn with_value(mut self, id: &str, value: impl Into<Value>) -> Self {
        self.values.insert(id.to_string(), value.into());
        self
    }

    pub fn with_unit(mut self, id: &str, unit: &str) -> Self {
        self.field_units.insert(id.to_string(), unit.to_string());
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn with_preset(mut self, preset: &str) -> Self {
        self.preset = Some(preset.to_string());
        self
    }
}

/// Registry plus settings, validated once.
#[derive(Debug, Clone)]
pub struct Engine {
    settings: EngineSettings,
    registry: Registry,
}

impl Engine {
    /// Engine over every built-in calculator
    pub fn new(settings: EngineSettings) -> CalcResult<Self> {
        Self::with_registry(settings, Registry::builtin()?)
    }

    /// Engine over a custom registry.
    ///
    /// Fails with `InvalidConfig` when any configuration breaks the schema
    /// contract, and with `MissingTranslation` when a locale is incomplete
    /// and the policy is `strict`.
    pub fn with_registry(settings: EngineSettings, mut registry: Registry) -> CalcResult<Self> {
        let ids: Vec<String> = registry.ids().map(str::to_string).collect();
        for id in &ids {
            if let Some(definition) = registry.get_mut(id) {
                definition.config.t.set_reference(settings.reference_locale.as_str());
            }
        }

        for definition in registry.iter() {
            let id = definition.id();
            let structural: Vec<String> = check_config(&definition.config)
                .iter()
                .filter(|issue| !issue.is_translation_gap())
                .map(ToString::to_string)
                .collect();
            if !structural.is_empty() {
                return Err(CalcError::invalid_config(id, structural));
            }

            for (locale, keys) in definition.config.t.parity_report() {
                match settings.missing_translation {
                    MissingTranslationPolicy::Fallback => warn!(
                        calculator = id,
                        locale = %locale,
                        missing = keys.len(),
                        "incomplete locale bundle, using reference strings"
                    ),
                    MissingTranslationPolicy::Strict => {
                        return Err(CalcError::MissingTranslation {
                            calculator_id: id.to_string(),
                            locale,
                            keys,
                        })
                    }
                }
            }
        }

        info!(
            calculators = registry.len(),
            default_locale = %settings.default_locale,
            "engine ready"
        );
        Ok(Engine { settings, registry })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configurations sorted by id
    pub fn calculators(&self) -> impl Iterator<Item = &CalculatorConfig> {
        self.registry.iter().map(|d| &d.config)
    }

    pub fn config(&self, calculator_id: &str) -> CalcResult<&CalculatorConfig> {
        Ok(&self.registry.get(calculator_id)?.config)
    }

    /// Input defaults with the preset applied on top
    pub fn preset_values(&self, calculator_id: &str, preset_id: &str) -> CalcResult<RawValueMap> {
        let config = self.config(calculator_id)?;
        let mut values = config.default_values();
        apply_preset(config, preset_id, &mut values)?;
        Ok(values)
    }

    /// Fields to show for the given (partial) values, in declaration order
    pub fn visible_inputs(&self, calculator_id: &str, values: &RawValueMap) -> CalcResult<Vec<&InputField>> {
        let config = self.config(calculator_id)?;
        Ok(visible_fields(config, values))
    }

    /// Localized view of a calculator; `None` uses the default locale
    pub fn describe(&self, calculator_id: &str, locale: Option<&str>) -> CalcResult<crate::view::CalculatorView> {
        let config = self.config(calculator_id)?;
        Ok(crate::view::describe(config, locale.unwrap_or(&self.settings.default_locale)))
    }

    /// Type-check a request without running the compute function
    pub fn validate(&self, request: &EvaluationRequest) -> CalcResult<()> {
        let definition = self.registry.get(&request.calculator_id)?;
        self.prepare(definition, request).map(|_| ())
    }

    /// Evaluate one request.
    pub fn evaluate(&self, request: &EvaluationRequest) -> CalcResult<CalculatorResults> {
        let definition = self.registry.get(&request.calculator_id)?;
        let input = self.prepare(definition, request)?;
        let results = (definition.compute)(&input);
        debug!(
            calculator = definition.id(),
            locale = %input.t.locale,
            valid = results.is_valid,
            error = results.error.as_deref().unwrap_or(""),
            "evaluated"
        );
        Ok(results)
    }

    /// Issues per calculator id; calculators without issues are omitted
    pub fn check(&self) -> BTreeMap<String, Vec<ConfigIssue>> {
        self.registry
            .iter()
            .filter_map(|definition| {
                let issues = check_config(&definition.config);
                (!issues.is_empty()).then(|| (definition.id().to_string(), issues))
            })
            .collect()
    }

    fn prepare(&self, definition: &CalculatorDefinition, request: &EvaluationRequest) -> CalcResult<ComputeInput> {
        let config = &definition.config;

        let mut values = config.default_values();
        if let Some(preset_id) = &request.preset {
            apply_preset(config, preset_id, &mut values)?;
        }
        for (id, raw) in &request.values {
            let Some(field) = config.field(id) else {
                debug!(calculator = %config.id, field = %id, "ignoring unknown input");
                continue;
            };
            if let Some(value) = checked_value(field, raw)? {
                values.insert(id.clone(), value);
            }
        }
        check_required(config, &values)?;

        let field_units = self.resolve_units(config, &request.field_units)?;
        let locale = request.locale.as_deref().unwrap_or(&self.settings.default_locale);

        Ok(ComputeInput {
            values,
            field_units,
            t: config.t.format_strings(locale),
        })
    }

    /// Validate unit overrides and fill the remaining currency fields with the
    /// request's first currency override, or the default currency without one
    fn resolve_units(&self, config: &CalculatorConfig, overrides: &UnitMap) -> CalcResult<UnitMap> {
        let mut units = UnitMap::new();
        for (id, unit) in overrides {
            let field = config
                .field(id)
                .ok_or_else(|| CalcError::invalid_input(id, unit, "no such input"))?;
            let Some(unit_type) = field.unit_type else {
                return Err(CalcError::invalid_input(id, unit, "field has no unit"));
            };
            if !field.accepts_unit(unit) || !is_known_unit(unit_type, unit) {
                return Err(CalcError::invalid_input(id, unit, "unit is not allowed for this field"));
            }
            units.insert(id.clone(), unit.clone());
        }

        let requested = config
            .inputs
            .iter()
            .filter(|field| field.unit_type == Some(UnitType::Currency))
            .find_map(|field| units.get(&field.id).cloned());
        let currency = requested.as_deref().unwrap_or(self.settings.default_currency.as_str());
        for field in &config.inputs {
            if field.unit_type != Some(UnitType::Currency) || units.contains_key(&field.id) {
                continue;
            }
            if field.accepts_unit(currency) && is_known_currency(currency) {
                units.insert(field.id.clone(), currency.to_string());
            } else {
                debug!(calculator = %config.id, field = %field.id, currency, "default currency not accepted");
            }
        }
        Ok(units)
    }
}

fn apply_preset(config: &CalculatorConfig, preset_id: &str, values: &mut RawValueMap) -> CalcResult<()> {
    let preset = config
        .preset(preset_id)
        .ok_or_else(|| CalcError::unknown_preset(&config.id, preset_id))?;
    for (id, value) in &preset.values {
        values.insert(id.clone(), value.to_json());
    }
    Ok(())
}

/// The value to store for a submitted raw value; `None` keeps the default
fn checked_value(field: &InputField, raw: &Value) -> CalcResult<Option<Value>> {
    if raw.is_null() {
        return Ok(None);
    }
    let Some(value) = FieldValue::from_json(raw) else {
        return Err(CalcError::invalid_input(&field.id, raw.to_string(), "expected a boolean, number or text"));
    };
    if is_blank(&value) {
        if field.required {
            return Err(CalcError::missing_field(&field.id));
        }
        return Ok(None);
    }
    if let Some(reason) = value_violation(field, &value) {
        return Err(CalcError::invalid_input(&field.id, value.to_string(), reason));
    }
    Ok(Some(raw.clone()))
}

/// Visible required fields must hold a non-blank value after merging
fn check_required(config: &CalculatorConfig, values: &RawValueMap) -> CalcResult<()> {
    for field in config.inputs.iter().filter(|f| f.required) {
        if !is_visible(config, field, values) {
            continue;
        }
        let present = values
            .get(&field.id)
            .and_then(FieldValue::from_json)
            .is_some_and(|value| !is_blank(&value));
        if !present {
            return Err(CalcError::missing_field(&field.id));
        }
    }
    Ok(())
}

fn is_blank(value: &FieldValue) -> bool {
    matches!(value, FieldValue::Text(text) if text.trim().is_empty())
}

fn is_known_unit(unit_type: UnitType, unit: &str) -> bool {
    match unit_type {
        UnitType::Currency => is_known_currency(unit),
        UnitType::DataSize => DataSizeUnit::from_symbol(unit).is_some(),
        UnitType::DataRate => DataRateUnit::from_symbol(unit).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::{bandwidth, CalculatorDefinition};
    use crate::locale::LocaleBundle;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(EngineSettings::default()).unwrap()
    }

    #[test]
    fn test_builtin_engine_builds() {
        let engine = engine();
        assert_eq!(engine.calculators().count(), 5);
        assert!(engine.check().is_empty());
    }

    #[test]
    fn test_unknown_calculator() {
        let err = engine().evaluate(&EvaluationRequest::new("mortgage")).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CALCULATOR");
    }

    #[test]
    fn test_defaults_evaluate() {
        let engine = engine();
        for id in ["bandwidth", "vlsm", "raid", "investment", "loan"] {
            let results = engine.evaluate(&EvaluationRequest::new(id)).unwrap();
            assert!(results.is_valid, "{} defaults should be valid", id);
            assert!(!results.summary.is_empty());
        }
    }

    #[test]
    fn test_select_outside_options() {
        let request = EvaluationRequest::new("bandwidth").with_value("fromUnit", "furlongs");
        let err = engine().evaluate(&request).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "fromUnit"));
    }

    #[test]
    fn test_number_out_of_range() {
        let request = EvaluationRequest::new("raid").with_value("driveCount", 500);
        assert!(matches!(
            engine().evaluate(&request),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_numeric_text_accepted() {
        let request = EvaluationRequest::new("loan").with_value("loanTerm", "15");
        assert!(engine().evaluate(&request).unwrap().is_valid);
    }

    #[test]
    fn test_required_blank_field() {
        let request = EvaluationRequest::new("vlsm").with_value("networkAddress", "  ");
        let err = engine().evaluate(&request).unwrap_err();
        assert_eq!(err, CalcError::missing_field("networkAddress"));
    }

    #[test]
    fn test_unknown_input_ignored() {
        let request = EvaluationRequest::new("loan").with_value("colour", "blue");
        assert!(engine().evaluate(&request).unwrap().is_valid);
    }

    #[test]
    fn test_unit_override_checked() {
        let engine = engine();
        let bad = EvaluationRequest::new("raid").with_unit("driveCapacity", "PB");
        assert!(matches!(engine.evaluate(&bad), Err(CalcError::InvalidInput { .. })));

        let unitless = EvaluationRequest::new("raid").with_unit("driveCount", "TB");
        assert!(engine.evaluate(&unitless).is_err());

        let good = EvaluationRequest::new("raid").with_unit("driveCapacity", "GB");
        assert!(engine.evaluate(&good).unwrap().is_valid);
    }

    #[test]
    fn test_default_currency_applied() {
        let settings = EngineSettings {
            default_currency: "EUR".into(),
            ..EngineSettings::default()
        };
        let engine = Engine::new(settings).unwrap();
        let results = engine.evaluate(&EvaluationRequest::new("loan")).unwrap();
        let payment = results.formatted.get("payment").unwrap();
        assert!(payment.contains('€'), "{}", payment);

        let usd = engine
            .evaluate(&EvaluationRequest::new("loan").with_unit("loanAmount", "USD"))
            .unwrap();
        assert!(usd.formatted["payment"].starts_with('$'));
    }

    #[test]
    fn test_currency_override_fills_sibling_fields() {
        let settings = EngineSettings {
            default_currency: "EUR".into(),
            ..EngineSettings::default()
        };
        let engine = Engine::new(settings).unwrap();
        let request = EvaluationRequest::new("loan")
            .with_value("extraPayment", 100)
            .with_unit("loanAmount", "GBP");
        let results = engine.evaluate(&request).unwrap();
        assert!(results.is_valid);
        assert!(results.formatted["payment"].starts_with('£'), "{}", results.formatted["payment"]);

        let mixed = request.with_unit("extraPayment", "USD");
        let results = engine.evaluate(&mixed).unwrap();
        assert!(!results.is_valid);
        assert_eq!(results.error.as_deref(), Some(crate::calculators::loan::ERROR_CURRENCY_MISMATCH));
    }

    #[test]
    fn test_preset_merge_order() {
        let engine = engine();
        let preset = engine.preset_values("loan", "mortgage").unwrap();
        let request = EvaluationRequest::new("loan")
            .with_preset("mortgage")
            .with_value("extraPayment", 0);
        let results = engine.evaluate(&request).unwrap();
        assert!(results.is_valid);
        assert_eq!(
            engine.config("loan").unwrap().default_values().len(),
            preset.len()
        );

        let err = engine
            .evaluate(&EvaluationRequest::new("loan").with_preset("yacht"))
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PRESET");
    }

    #[test]
    fn test_visible_inputs_follow_mode() {
        let engine = engine();
        let convert = engine.visible_inputs("bandwidth", &RawValueMap::new()).unwrap();
        assert!(convert.iter().all(|f| f.id != "pageViews"));

        let mut values = RawValueMap::new();
        values.insert("mode".into(), json!("website"));
        let website = engine.visible_inputs("bandwidth", &values).unwrap();
        assert!(website.iter().any(|f| f.id == "pageViews"));
    }

    #[test]
    fn test_locale_selection() {
        let engine = engine();
        let de = engine
            .evaluate(&EvaluationRequest::new("loan").with_locale("de-AT"))
            .unwrap();
        assert!(de.summary.contains("Zinsen"), "{}", de.summary);

        let german_default = Engine::new(EngineSettings {
            default_locale: "de".into(),
            ..EngineSettings::default()
        })
        .unwrap();
        let view = german_default.describe("loan", None).unwrap();
        assert_eq!(view.name, "Kreditrechner");
    }

    fn gappy_registry() -> Registry {
        let mut config = bandwidth::config().unwrap();
        config
            .t
            .insert("es", LocaleBundle::from_json_str("es.json", r#"{"name":"Ancho de banda"}"#).unwrap());
        let mut registry = Registry::new();
        registry
            .register(CalculatorDefinition::new(config, bandwidth::compute))
            .unwrap();
        registry
    }

    #[test]
    fn test_missing_translation_policies() {
        let fallback = Engine::with_registry(EngineSettings::default(), gappy_registry()).unwrap();
        let results = fallback
            .evaluate(&EvaluationRequest::new("bandwidth").with_locale("es"))
            .unwrap();
        assert!(results.is_valid);
        assert!(!results.summary.contains('{'));
        assert_eq!(fallback.check()["bandwidth"].len(), 1);

        let strict = EngineSettings {
            missing_translation: MissingTranslationPolicy::Strict,
            ..EngineSettings::default()
        };
        let err = Engine::with_registry(strict, gappy_registry()).unwrap_err();
        assert!(matches!(err, CalcError::MissingTranslation { ref locale, .. } if locale == "es"));
    }

    #[test]
    fn test_structural_issue_rejected() {
        let mut config = bandwidth::config().unwrap();
        config.version = "latest".into();
        let mut registry = Registry::new();
        registry
            .register(CalculatorDefinition::new(config, bandwidth::compute))
            .unwrap();
        let err = Engine::with_registry(EngineSettings::default(), registry).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_request_deserializes() {
        let request: EvaluationRequest = serde_json::from_value(json!({
            "calculatorId": "loan",
            "values": {"loanAmount": 1000},
            "fieldUnits": {"loanAmount": "EUR"}
        }))
        .unwrap();
        assert_eq!(request.field_units["loanAmount"], "EUR");
        assert!(request.locale.is_none());
    }
}
