//! # Compute Input
//!
//! What a compute function receives: raw values keyed by input id, optional
//! per-field unit overrides, and the small set of localized strings it
//! interpolates.
//!
//! The accessors implement the "extract & default" step every compute
//! function starts with. They coerce loosely (numeric text parses as a
//! number, `"true"` as a boolean) and fall back to the supplied default for
//! absent, null or non-finite values, so compute functions only ever see
//! well-formed scalars.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "values": { "value": 100, "fromUnit": "mbps", "toUnit": "MBps" },
//!   "fieldUnits": { "avgPageSize": "KB" },
//!   "t": { "locale": "en", "formats": { "summary": "{value} = {result}" } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::NumberFormat;
use crate::locale::LocaleFormatStrings;

/// Raw submitted values keyed by input id
pub type RawValueMap = BTreeMap<String, Value>;

/// Per-field unit overrides keyed by input id (e.g. `"initialInvestment" -> "EUR"`)
pub type UnitMap = BTreeMap<String, String>;

/// Everything a compute function may read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInput {
    #[serde(default)]
    pub values: RawValueMap,
    #[serde(default)]
    pub field_units: UnitMap,
    #[serde(default)]
    pub t: LocaleFormatStrings,
}

impl ComputeInput {
    /// Input with values only; English strings and no unit overrides
    pub fn from_values(values: RawValueMap) -> Self {
        ComputeInput {
            values,
            ..ComputeInput::default()
        }
    }

    /// Builder-style value setter, mostly for tests and the CLI
    pub fn with(mut self, id: &str, value: impl Into<Value>) -> Self {
        self.values.insert(id.to_string(), value.into());
        self
    }

    /// Builder-style unit override
    pub fn with_unit(mut self, id: &str, unit: &str) -> Self {
        self.field_units.insert(id.to_string(), unit.to_string());
        self
    }

    /// Numeric value, if present and finite
    pub fn opt_number(&self, id: &str) -> Option<f64> {
        let number = match self.values.get(id)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    }

    /// Numeric value or `default`
    pub fn number(&self, id: &str, default: f64) -> f64 {
        self.opt_number(id).unwrap_or(default)
    }

    /// Text value or `default`. Numbers are rendered ("24").
    pub fn text(&self, id: &str, default: &str) -> String {
        match self.values.get(id) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                _ => n.to_string(),
            },
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Boolean value or `default`; accepts `"true"`/`"false"` and 0/1
    pub fn flag(&self, id: &str, default: bool) -> bool {
        match self.values.get(id) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
            _ => default,
        }
    }

    /// Unit chosen for a field, or `default`
    pub fn unit<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        self.field_units.get(id).map(String::as_str).unwrap_or(default)
    }

    /// Number formatting conventions for the requested locale
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::for_locale(&self.t.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion() {
        let input = ComputeInput::default()
            .with("a", 2.5)
            .with("b", "42")
            .with("c", "abc")
            .with("d", Value::Null);
        assert_eq!(input.number("a", 0.0), 2.5);
        assert_eq!(input.number("b", 0.0), 42.0);
        assert_eq!(input.number("c", 7.0), 7.0);
        assert_eq!(input.number("d", 7.0), 7.0);
        assert_eq!(input.number("missing", 1.0), 1.0);
    }

    #[test]
    fn test_text_and_flags() {
        let input = ComputeInput::default()
            .with("level", 50)
            .with("name", "LAN")
            .with("on", "yes")
            .with("off", 0);
        assert_eq!(input.text("level", ""), "50");
        assert_eq!(input.text("name", ""), "LAN");
        assert_eq!(input.text("none", "dflt"), "dflt");
        assert!(input.flag("on", false));
        assert!(!input.flag("off", true));
    }

    #[test]
    fn test_units() {
        let input = ComputeInput::default().with_unit("cost", "EUR");
        assert_eq!(input.unit("cost", "USD"), "EUR");
        assert_eq!(input.unit("other", "USD"), "USD");
    }

    #[test]
    fn test_deserialize_camel_case() {
        let input: ComputeInput = serde_json::from_value(json!({
            "values": { "x": 1 },
            "fieldUnits": { "x": "KB" },
            "t": { "formats": { "summary": "s" } }
        }))
        .unwrap();
        assert_eq!(input.unit("x", "MB"), "KB");
        assert_eq!(input.t.locale, "en");
        assert_eq!(input.t.format("summary", ""), "s");
    }
}
