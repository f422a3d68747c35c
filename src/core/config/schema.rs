//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! [i18n]
//! default_locale = "en"
//! supported_locales = ["en", "fr", "de"]
//!
//! [[fields]]
//! name = "dc.contributor.author"
//! scope_note = "Person responsible"
//!
//! [[authority]]
//! field = "dc.contributor.author"
//! required = false
//! choices = true
//! owner_kinds = ["item"]
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: locales must be present, the
//! default locale must be supported, and authority rows must name a
//! registered field at most once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::matcher::locale_language;
use crate::core::types::{FieldName, OwnerKind};

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoMetaConfig {
    /// Locale settings
    pub i18n: I18nConfig,

    /// Field registry seed
    pub fields: Vec<FieldConfig>,

    /// Authority control rows
    pub authority: Vec<AuthorityRule>,
}

impl RepoMetaConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.i18n.validate()?;

        let mut registered = HashSet::new();
        for field in &self.fields {
            if !registered.insert(&field.name) {
                return Err(ConfigError::InvalidValue(format!(
                    "field '{}' is listed more than once",
                    field.name
                )));
            }
        }

        let mut controlled = HashSet::new();
        for rule in &self.authority {
            if !registered.contains(&rule.field) {
                return Err(ConfigError::InvalidValue(format!(
                    "authority row names unregistered field '{}'",
                    rule.field
                )));
            }
            if !controlled.insert(&rule.field) {
                return Err(ConfigError::InvalidValue(format!(
                    "authority row for '{}' is repeated",
                    rule.field
                )));
            }
        }

        Ok(())
    }
}

/// Locale settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct I18nConfig {
    /// Locale used for authority lookups
    pub default_locale: String,

    /// Supported locales, in fallback order
    pub supported_locales: Vec<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string()],
        }
    }
}

impl I18nConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_locales.is_empty() {
            return Err(ConfigError::InvalidValue(
                "supported_locales cannot be empty".to_string(),
            ));
        }
        if self.supported_locales.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "supported_locales cannot contain blank entries".to_string(),
            ));
        }

        let default_language = locale_language(&self.default_locale);
        if !self
            .supported_languages()
            .iter()
            .any(|l| l == default_language)
        {
            return Err(ConfigError::InvalidValue(format!(
                "default_locale '{}' is not among supported_locales: {}",
                self.default_locale,
                self.supported_locales.join(", ")
            )));
        }
        Ok(())
    }

    /// Language parts of the supported locales, in order, without repeats.
    pub fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for locale in &self.supported_locales {
            let language = locale_language(locale.trim()).to_string();
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }
}

/// A field to register at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: FieldName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_note: Option<String>,
}

/// Marks a field as authority-controlled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthorityRule {
    pub field: FieldName,

    /// Values must carry an authority key
    #[serde(default)]
    pub required: bool,

    /// A choice list is configured, so batch adds consult the resolver
    #[serde(default)]
    pub choices: bool,

    /// Owner kinds the row applies to; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_kinds: Vec<OwnerKind>,
}
