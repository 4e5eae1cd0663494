//! Conditional field visibility (`showWhen`).
//!
//! A field is visible when it has no condition, or when the controlling
//! field is itself visible and its current value matches the condition.
//! The current value is the submitted one, or the controlling field's
//! default when nothing was submitted.

use crate::input::RawValueMap;

use super::{CalculatorConfig, FieldValue, InputField, ShowWhenValue};

/// Guard against configurations whose conditions reference each other
const MAX_CHAIN_DEPTH: usize = 16;

/// Whether `field` should be shown for the given raw values.
pub fn is_visible(config: &CalculatorConfig, field: &InputField, values: &RawValueMap) -> bool {
    visible_at_depth(config, field, values, 0)
}

/// The visible fields of `config`, in declaration order
pub fn visible_fields<'a>(config: &'a CalculatorConfig, values: &RawValueMap) -> Vec<&'a InputField> {
    config
        .inputs
        .iter()
        .filter(|field| is_visible(config, field, values))
        .collect()
}

fn visible_at_depth(config: &CalculatorConfig, field: &InputField, values: &RawValueMap, depth: usize) -> bool {
    let Some(condition) = &field.show_when else {
        return true;
    };
    if depth >= MAX_CHAIN_DEPTH {
        return false;
    }
    let Some(controller) = config.field(&condition.field) else {
        return false;
    };
    if !visible_at_depth(config, controller, values, depth + 1) {
        return false;
    }

    let current = values
        .get(&controller.id)
        .and_then(FieldValue::from_json)
        .unwrap_or_else(|| controller.default_value.clone());

    match &condition.value {
        ShowWhenValue::One(expected) => current.loosely_equals(expected),
        ShowWhenValue::AnyOf(candidates) => candidates.iter().any(|c| current.loosely_equals(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Category, InputField};
    use serde_json::json;

    fn config() -> CalculatorConfig {
        CalculatorConfig::new("t", "1.0.0", Category::Storage, "disk")
            .with_input(InputField::select("level", "5", &["5", "50", "60"]))
            .with_input(InputField::number("groups", 3.0).show_when_any("level", &["50", "60"]))
            .with_input(InputField::toggle("advanced", false).show_when_any("level", &["50", "60"]))
            .with_input(InputField::number("spares", 0.0).show_when("advanced", true))
            .with_input(InputField::number("orphan", 0.0).show_when("missing", "x"))
    }

    fn visible_ids(values: RawValueMap) -> Vec<String> {
        let cfg = config();
        visible_fields(&cfg, &values).into_iter().map(|f| f.id.clone()).collect()
    }

    #[test]
    fn test_defaults_drive_visibility() {
        assert_eq!(visible_ids(RawValueMap::new()), vec!["level"]);
    }

    #[test]
    fn test_list_match() {
        let values = RawValueMap::from([("level".to_string(), json!("60"))]);
        assert_eq!(visible_ids(values), vec!["level", "groups", "advanced"]);
    }

    #[test]
    fn test_chained_condition() {
        let values = RawValueMap::from([
            ("level".to_string(), json!("50")),
            ("advanced".to_string(), json!(true)),
        ]);
        assert_eq!(visible_ids(values), vec!["level", "groups", "advanced", "spares"]);

        // controller hidden -> dependent hidden even though its value matches
        let values = RawValueMap::from([
            ("level".to_string(), json!("5")),
            ("advanced".to_string(), json!(true)),
        ]);
        assert_eq!(visible_ids(values), vec!["level"]);
    }

    #[test]
    fn test_numeric_select_value() {
        let values = RawValueMap::from([("level".to_string(), json!(50))]);
        assert!(visible_ids(values).contains(&"groups".to_string()));
    }
}
