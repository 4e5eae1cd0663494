//! # Locale Bundles
//!
//! Every calculator ships one JSON string bundle per language under
//! `locales/<calculator-id>/<lang>.json`. The files are embedded into the
//! binary with `rust-embed` and parsed once when the registry is built.
//!
//! ## Bundle layout
//!
//! ```json
//! {
//!   "name": "Bandwidth Calculator",
//!   "inputs":  { "pageViews": { "label": "...", "help": "...", "options": { ... } } },
//!   "results": { "averageMbps": { "label": "..." } },
//!   "presets": { "smallBlog": { "name": "...", "description": "..." } },
//!   "values":  { "modeConvert": "..." },
//!   "formats": { "summary": "Average {averageMbps} ..." }
//! }
//! ```
//!
//! Keys are addressed with dotted paths (`inputs.pageViews.label`). The
//! `values` and `formats` sections are the only part handed to compute
//! functions; the rest is for the presentation layer.
//!
//! ## Missing keys
//!
//! The reference locale (English) defines the key set. Other locales should
//! carry every key; lookups that miss fall back to the reference bundle, and
//! [`LocaleCatalog::missing_keys`] reports the gaps so the engine can warn
//! or refuse to start depending on settings.

use std::collections::{BTreeMap, BTreeSet};

use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CalcError, CalcResult};

/// Locale every bundle is compared against
pub const REFERENCE_LOCALE: &str = "en";

#[derive(RustEmbed)]
#[folder = "locales/"]
struct LocaleAssets;

/// One language's string tree for one calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleBundle(Map<String, Value>);

impl LocaleBundle {
    /// Parse a bundle from JSON text. The document must be an object.
    pub fn from_json_str(path: &str, text: &str) -> CalcResult<Self> {
        Self::from_json_slice(path, text.as_bytes())
    }

    fn from_json_slice(path: &str, data: &[u8]) -> CalcResult<Self> {
        let value: Value =
            serde_json::from_slice(data).map_err(|e| CalcError::locale_error(path, e.to_string()))?;
        match value {
            Value::Object(map) => Ok(LocaleBundle(map)),
            _ => Err(CalcError::locale_error(path, "bundle root must be a JSON object")),
        }
    }

    /// Look up a string by dotted path
    pub fn get(&self, key: &str) -> Option<&str> {
        let mut parts = key.split('.');
        let mut node = self.0.get(parts.next()?)?;
        for part in parts {
            node = node.as_object()?.get(part)?;
        }
        node.as_str()
    }

    /// All leaf keys as dotted paths
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        collect_keys("", &self.0, &mut keys);
        keys
    }

    /// Flattened string leaves below `prefix`, keyed relative to it.
    pub fn section(&self, prefix: &str) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let mut node: Option<&Map<String, Value>> = Some(&self.0);
        for part in prefix.split('.').filter(|p| !p.is_empty()) {
            node = node.and_then(|n| n.get(part)).and_then(Value::as_object);
        }
        if let Some(map) = node {
            let mut keys = BTreeSet::new();
            collect_keys("", map, &mut keys);
            for key in keys {
                if let Some(text) = lookup(map, &key) {
                    out.insert(key, text.to_string());
                }
            }
        }
        out
    }
}

fn collect_keys(prefix: &str, map: &Map<String, Value>, keys: &mut BTreeSet<String>) {
    for (name, value) in map {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            Value::Object(child) => collect_keys(&path, child, keys),
            _ => {
                keys.insert(path);
            }
        }
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    let mut parts = key.split('.');
    let mut node = map.get(parts.next()?)?;
    for part in parts {
        node = node.as_object()?.get(part)?;
    }
    node.as_str()
}

/// The subset of localized strings a compute function interpolates.
///
/// `values` holds short labels (risk levels, mode names), `formats` holds
/// `{placeholder}` templates such as the summary sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleFormatStrings {
    /// Locale these strings were resolved for; drives number formatting
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

fn default_locale() -> String {
    REFERENCE_LOCALE.to_string()
}

impl Default for LocaleFormatStrings {
    fn default() -> Self {
        LocaleFormatStrings {
            locale: default_locale(),
            values: BTreeMap::new(),
            formats: BTreeMap::new(),
        }
    }
}

impl LocaleFormatStrings {
    /// Value label, or `default` when the key is absent
    pub fn value<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Format template, or `default` when the key is absent
    pub fn format<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.formats.get(key).map(String::as_str).unwrap_or(default)
    }
}

/// All bundles of one calculator, keyed by locale code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleCatalog {
    reference: String,
    bundles: BTreeMap<String, LocaleBundle>,
}

impl Default for LocaleCatalog {
    fn default() -> Self {
        LocaleCatalog::new(REFERENCE_LOCALE)
    }
}

impl LocaleCatalog {
    /// Create an empty catalog whose parity baseline is `reference`
    pub fn new(reference: impl Into<String>) -> Self {
        LocaleCatalog {
            reference: reference.into(),
            bundles: BTreeMap::new(),
        }
    }

    /// Load the embedded bundles for a calculator (`locales/<id>/*.json`).
    pub fn load_embedded(calculator_id: &str) -> CalcResult<Self> {
        let mut catalog = LocaleCatalog::default();
        let prefix = format!("{}/", calculator_id);
        for path in LocaleAssets::iter() {
            let Some(file_name) = path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let Some(locale) = file_name.strip_suffix(".json") else {
                continue;
            };
            let file = LocaleAssets::get(&path)
                .ok_or_else(|| CalcError::locale_error(path.to_string(), "embedded file disappeared"))?;
            let bundle = LocaleBundle::from_json_slice(&path, &file.data)?;
            catalog.insert(locale, bundle);
        }
        if !catalog.bundles.contains_key(&catalog.reference) {
            return Err(CalcError::locale_error(
                format!("{}{}.json", prefix, catalog.reference),
                "reference locale bundle is missing",
            ));
        }
        Ok(catalog)
    }

    /// Add or replace a bundle
    pub fn insert(&mut self, locale: impl Into<String>, bundle: LocaleBundle) {
        self.bundles.insert(locale.into(), bundle);
    }

    /// The reference locale code
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Change the parity baseline and fallback locale
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }

    /// Locale codes with a bundle, sorted
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn bundle(&self, locale: &str) -> Option<&LocaleBundle> {
        self.bundles.get(locale)
    }

    /// Pick the bundle to use for a requested locale: exact match, then the
    /// bare language (`de-AT` -> `de`), then the reference locale.
    pub fn resolve_locale<'a>(&'a self, requested: &'a str) -> &'a str {
        if self.bundles.contains_key(requested) {
            return requested;
        }
        let language = requested.split(['-', '_']).next().unwrap_or(requested);
        if self.bundles.contains_key(language) {
            return language;
        }
        &self.reference
    }

    /// Localized string with reference-locale fallback
    pub fn text(&self, locale: &str, key: &str) -> Option<&str> {
        let resolved = self.resolve_locale(locale);
        self.bundles
            .get(resolved)
            .and_then(|b| b.get(key))
            .or_else(|| self.bundles.get(&self.reference).and_then(|b| b.get(key)))
    }

    /// Localized string, or the key itself when no bundle has it
    pub fn text_or_key(&self, locale: &str, key: &str) -> String {
        self.text(locale, key).unwrap_or(key).to_string()
    }

    /// Keys present in the reference bundle but absent from `locale`
    pub fn missing_keys(&self, locale: &str) -> Vec<String> {
        let Some(reference) = self.bundles.get(&self.reference) else {
            return Vec::new();
        };
        let Some(bundle) = self.bundles.get(locale) else {
            return reference.keys().into_iter().collect();
        };
        let present = bundle.keys();
        reference
            .keys()
            .into_iter()
            .filter(|key| !present.contains(key))
            .collect()
    }

    /// Missing keys for every non-reference locale that has gaps
    pub fn parity_report(&self) -> BTreeMap<String, Vec<String>> {
        self.bundles
            .keys()
            .filter(|locale| **locale != self.reference)
            .filter_map(|locale| {
                let missing = self.missing_keys(locale);
                (!missing.is_empty()).then(|| (locale.clone(), missing))
            })
            .collect()
    }

    /// Strings handed to a compute function: the reference `values` and
    /// `formats` sections overlaid with the requested locale's.
    pub fn format_strings(&self, locale: &str) -> LocaleFormatStrings {
        let resolved = self.resolve_locale(locale).to_string();
        let mut strings = LocaleFormatStrings {
            locale: resolved.clone(),
            ..LocaleFormatStrings::default()
        };
        for code in [self.reference.as_str(), resolved.as_str()] {
            if let Some(bundle) = self.bundles.get(code) {
                strings.values.extend(bundle.section("values"));
                strings.formats.extend(bundle.section("formats"));
            }
        }
        strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(json: &str) -> LocaleBundle {
        LocaleBundle::from_json_str("test.json", json).unwrap()
    }

    fn catalog() -> LocaleCatalog {
        let mut catalog = LocaleCatalog::default();
        catalog.insert(
            "en",
            bundle(r#"{"name":"Loan","inputs":{"rate":{"label":"Rate","help":"Yearly"}},"formats":{"summary":"Pay {payment}"},"values":{"low":"Low"}}"#),
        );
        catalog.insert(
            "de",
            bundle(r#"{"name":"Kredit","inputs":{"rate":{"label":"Zins"}},"formats":{"summary":"Zahle {payment}"}}"#),
        );
        catalog
    }

    #[test]
    fn test_dotted_lookup() {
        let c = catalog();
        assert_eq!(c.text("de", "inputs.rate.label"), Some("Zins"));
        assert_eq!(c.text("en", "inputs.rate.missing"), None);
    }

    #[test]
    fn test_fallback_to_reference() {
        let c = catalog();
        assert_eq!(c.text("de", "inputs.rate.help"), Some("Yearly"));
        assert_eq!(c.text("ja", "name"), Some("Loan"));
        assert_eq!(c.text("de-AT", "name"), Some("Kredit"));
        assert_eq!(c.text_or_key("de", "nope"), "nope");
    }

    #[test]
    fn test_missing_keys() {
        let c = catalog();
        assert_eq!(c.missing_keys("de"), vec!["inputs.rate.help", "values.low"]);
        assert!(c.missing_keys("en").is_empty());
        assert_eq!(c.parity_report().len(), 1);
    }

    #[test]
    fn test_format_strings_overlay() {
        let strings = catalog().format_strings("de");
        assert_eq!(strings.locale, "de");
        assert_eq!(strings.format("summary", ""), "Zahle {payment}");
        assert_eq!(strings.value("low", "?"), "Low");
        assert_eq!(strings.value("absent", "fallback"), "fallback");
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = LocaleBundle::from_json_str("bad.json", "[1,2]").unwrap_err();
        assert_eq!(err.error_code(), "LOCALE_ERROR");
    }

    #[test]
    fn test_embedded_bundles_load() {
        let catalog = LocaleCatalog::load_embedded("bandwidth").unwrap();
        assert!(catalog.locales().any(|l| l == "en"));
        assert!(catalog.text("en", "name").is_some());
    }

    #[test]
    fn test_unknown_calculator_has_no_bundles() {
        assert!(LocaleCatalog::load_embedded("does-not-exist").is_err());
    }
}
