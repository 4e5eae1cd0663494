//! `{placeholder}` substitution for localized summary and label templates.
//!
//! Unknown placeholders are left in the output verbatim, so a template that
//! references a value the compute function never produced shows up as
//! visibly wrong text instead of failing the calculation.

use std::collections::BTreeMap;

/// Substitute every `{key}` in `template` with `values[key]`.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use calc_engine::template::render;
///
/// let mut values = BTreeMap::new();
/// values.insert("rate".to_string(), "12.5 MB/s".to_string());
/// assert_eq!(render("Result: {rate} ({missing})", &values), "Result: 12.5 MB/s ({missing})");
/// ```
pub fn render(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_key(&after[..end]) => {
                let key = &after[..end];
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Placeholder names in order of first appearance, without duplicates.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_key(&after[..end]) => {
                let key = &after[..end];
                if !found.iter().any(|k| k == key) {
                    found.push(key.to_string());
                }
                rest = &after[end + 1..];
            }
            _ => rest = after,
        }
    }
    found
}

fn is_key(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_substitutes() {
        let values = vars(&[("balance", "$10"), ("years", "5")]);
        assert_eq!(render("{balance} after {years} years", &values), "$10 after 5 years");
    }

    #[test]
    fn test_render_keeps_unknown() {
        assert_eq!(render("x = {x}", &BTreeMap::new()), "x = {x}");
    }

    #[test]
    fn test_render_ignores_non_keys() {
        let values = vars(&[("a", "1")]);
        assert_eq!(render("{ a } {a} {", &values), "{ a } 1 {");
        assert_eq!(render("{{a}}", &values), "{1}");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("{a} and {b} then {a}"), vec!["a", "b"]);
        assert!(placeholders("no tokens here").is_empty());
    }
}
