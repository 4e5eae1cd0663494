//! # Engine Settings
//!
//! Runtime options of the evaluation engine, loadable from TOML.
//!
//! ```toml
//! default_locale = "de"
//! reference_locale = "en"
//! missing_translation = "strict"
//! default_currency = "EUR"
//! ```
//!
//! Every key is optional; unknown keys are rejected so typos surface early.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::locale::REFERENCE_LOCALE;

/// What to do when a locale bundle lacks keys the reference bundle has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTranslationPolicy {
    /// Log a warning and resolve the key from the reference locale
    #[default]
    Fallback,
    /// Refuse to build the engine
    Strict,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Locale used when a request names none
    pub default_locale: String,

    /// Parity baseline and fallback locale
    pub reference_locale: String,

    pub missing_translation: MissingTranslationPolicy,

    /// Currency code for currency fields without a unit override
    pub default_currency: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_locale: REFERENCE_LOCALE.to_string(),
            reference_locale: REFERENCE_LOCALE.to_string(),
            missing_translation: MissingTranslationPolicy::Fallback,
            default_currency: "USD".to_string(),
        }
    }
}

impl EngineSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        Self::parse("<inline>", text)
    }

    /// Read settings from a TOML file
    pub fn load(path: &Path) -> CalcResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| CalcError::settings_error(path.display().to_string(), e.to_string()))?;
        Self::parse(&path.display().to_string(), &text)
    }

    fn parse(origin: &str, text: &str) -> CalcResult<Self> {
        let settings: EngineSettings =
            toml::from_str(text).map_err(|e| CalcError::settings_error(origin, e.to_string()))?;
        if settings.default_locale.trim().is_empty() || settings.reference_locale.trim().is_empty() {
            return Err(CalcError::settings_error(origin, "locale codes must not be empty"));
        }
        if settings.default_currency.trim().is_empty() {
            return Err(CalcError::settings_error(origin, "default_currency must not be empty"));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_locale, "en");
        assert_eq!(settings.missing_translation, MissingTranslationPolicy::Fallback);
        assert_eq!(settings.default_currency, "USD");
    }

    #[test]
    fn test_partial_toml() {
        let settings = EngineSettings::from_toml_str("default_locale = \"de\"\nmissing_translation = \"strict\"").unwrap();
        assert_eq!(settings.default_locale, "de");
        assert_eq!(settings.reference_locale, "en");
        assert_eq!(settings.missing_translation, MissingTranslationPolicy::Strict);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineSettings::from_toml_str("default_lcoale = \"de\"").unwrap_err();
        assert_eq!(err.error_code(), "SETTINGS_ERROR");
    }

    #[test]
    fn test_empty_locale_rejected() {
        assert!(EngineSettings::from_toml_str("default_locale = \"\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("calc_engine_settings_{}.toml", std::process::id()));
        fs::write(&path, "default_currency = \"EUR\"\n").unwrap();
        let settings = EngineSettings::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(settings.default_currency, "EUR");

        let missing = EngineSettings::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(CalcError::SettingsError { .. })));
    }
}
