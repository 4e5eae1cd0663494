//! # Calculator Results
//!
//! The output of every compute function.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "values": { "result": 12.5, "mbps": 100.0 },
//!   "formatted": { "result": "12.5 MB/s", "mbps": "100 Mbps" },
//!   "summary": "100 Mbps equals 12.5 MB/s",
//!   "isValid": true
//! }
//! ```
//!
//! When `isValid` is false, `values` and `formatted` are empty. The summary
//! may carry an explanation and `error` a stable machine-readable code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template;

/// A raw result datum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Bool(bool),
    Number(f64),
}

impl ResultValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) => Some(*n),
            ResultValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResultValue::Bool(b) => Some(*b),
            ResultValue::Number(_) => None,
        }
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Number(value)
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        ResultValue::Bool(value)
    }
}

/// Typed, localized result set of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResults {
    pub values: BTreeMap<String, ResultValue>,
    pub formatted: BTreeMap<String, String>,
    pub summary: String,
    pub is_valid: bool,
    /// Row data for charts and detail tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Stable code explaining an invalid result (e.g. "does_not_fit")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalculatorResults {
    /// The universal early-exit result for input that fails validation
    pub fn invalid() -> Self {
        CalculatorResults {
            values: BTreeMap::new(),
            formatted: BTreeMap::new(),
            summary: String::new(),
            is_valid: false,
            metadata: None,
            error: None,
        }
    }

    /// Invalid result carrying an error code and a human-readable message
    pub fn invalid_with(code: &str, message: impl Into<String>) -> Self {
        CalculatorResults {
            summary: message.into(),
            error: Some(code.to_string()),
            ..Self::invalid()
        }
    }

    /// Numeric value by result id
    pub fn number(&self, id: &str) -> Option<f64> {
        self.values.get(id).and_then(ResultValue::as_f64)
    }

    /// Formatted string by result id
    pub fn text(&self, id: &str) -> Option<&str> {
        self.formatted.get(id).map(String::as_str)
    }
}

/// Accumulates values and formatted strings, then renders the summary.
///
/// ```rust
/// use calc_engine::results::ResultBuilder;
///
/// let results = ResultBuilder::new()
///     .entry("total", 42.0, "42 units")
///     .summary("Total: {total}")
///     .build();
/// assert!(results.is_valid);
/// assert_eq!(results.summary, "Total: 42 units");
/// ```
#[derive(Debug, Default)]
pub struct ResultBuilder {
    values: BTreeMap<String, ResultValue>,
    formatted: BTreeMap<String, String>,
    extra: BTreeMap<String, String>,
    summary_template: String,
    metadata: Option<Value>,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value only
    pub fn value(mut self, id: &str, value: impl Into<ResultValue>) -> Self {
        self.values.insert(id.to_string(), value.into());
        self
    }

    /// Formatted string only
    pub fn formatted(mut self, id: &str, text: impl Into<String>) -> Self {
        self.formatted.insert(id.to_string(), text.into());
        self
    }

    /// Raw value and its display string under the same id
    pub fn entry(self, id: &str, value: impl Into<ResultValue>, text: impl Into<String>) -> Self {
        self.value(id, value).formatted(id, text)
    }

    /// Extra template variable that is not itself a result
    pub fn var(mut self, key: &str, text: impl Into<String>) -> Self {
        self.extra.insert(key.to_string(), text.into());
        self
    }

    /// Summary template; `{id}` tokens resolve against formatted results
    /// first, then extra variables
    pub fn summary(mut self, template: &str) -> Self {
        self.summary_template = template.to_string();
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> CalculatorResults {
        let mut vars = self.extra;
        vars.extend(self.formatted.iter().map(|(k, v)| (k.clone(), v.clone())));
        let summary = template::render(&self.summary_template, &vars);
        CalculatorResults {
            values: self.values,
            formatted: self.formatted,
            summary,
            is_valid: true,
            metadata: self.metadata,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_is_empty() {
        let results = CalculatorResults::invalid_with("does_not_fit", "Too many hosts");
        assert!(!results.is_valid);
        assert!(results.values.is_empty());
        assert!(results.formatted.is_empty());
        assert_eq!(results.error.as_deref(), Some("does_not_fit"));
    }

    #[test]
    fn test_builder_summary_prefers_results() {
        let results = ResultBuilder::new()
            .entry("a", 1.0, "one")
            .var("a", "shadowed")
            .var("b", "two")
            .summary("{a} {b} {c}")
            .build();
        assert_eq!(results.summary, "one two {c}");
    }

    #[test]
    fn test_serialization_shape() {
        let results = ResultBuilder::new()
            .entry("x", 2.0, "2")
            .value("ok", true)
            .metadata(json!({"rows": []}))
            .build();
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["isValid"], true);
        assert_eq!(value["values"]["ok"], true);
        assert_eq!(value["values"]["x"], 2.0);
        assert!(value.get("error").is_none());

        let roundtrip: CalculatorResults = serde_json::from_value(value).unwrap();
        assert_eq!(roundtrip, results);
    }
}
